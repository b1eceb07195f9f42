use std::fmt::Write;

use sqlmigrate_db::MigrationStatus;

pub fn applied_summary(applied: usize) -> String {
    match applied {
        1 => "Applied 1 migration.".to_string(),
        n => format!("Applied {n} migrations."),
    }
}

/// Render the `status` table: applied ids with timestamps, then pending ids.
pub fn render_status(status: &MigrationStatus) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Applied ({}):", status.applied.len());
    let mut applied = status.applied.clone();
    applied.sort_by(|a, b| a.applied_at.cmp(&b.applied_at).then(a.id.cmp(&b.id)));
    for record in &applied {
        let at = record
            .applied_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "  {:<40} {at}", record.id);
    }

    let _ = writeln!(out, "Pending ({}):", status.pending.len());
    for migration in &status.pending {
        let _ = writeln!(out, "  {}", migration.id);
    }

    out
}
