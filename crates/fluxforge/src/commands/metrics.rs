//! Dashboard metrics command handler.

use fluxforge_api::types::Metrics;
use fluxforge_core::Portal;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(m: &Metrics) -> String {
    let mut lines = vec![
        format!("Devices:       {} ({} enabled)", m.total_devices, m.enabled_devices),
        format!("Tags:          {} ({} enabled)", m.total_tags, m.enabled_tags),
        format!("Scan classes:  {}", m.scan_class_count),
        format!("InfluxDB:      {}", m.influxdb_count),
    ];

    if !m.tags_by_scan_class.is_empty() {
        lines.push(String::new());
        lines.push("Enabled tags by scan class:".to_owned());
        for load in &m.tags_by_scan_class {
            lines.push(format!(
                "  {:<20} {:>6} ms  {} tags",
                load.name, load.interval_ms, load.tag_count
            ));
        }
    }

    if !m.device_summary.is_empty() {
        lines.push(String::new());
        lines.push("Devices:".to_owned());
        for d in &m.device_summary {
            lines.push(format!(
                "  {:<20} {:<28} {} enabled tags -> {}",
                d.name,
                d.endpoint_url,
                d.enabled_tag_count,
                d.influxdb_name.as_deref().unwrap_or("-")
            ));
        }
    }

    lines.join("\n")
}

pub async fn handle(portal: &Portal, global: &GlobalOpts) -> Result<(), CliError> {
    let metrics = portal.client().get_metrics().await?;
    let out = output::render_single(&global.output, &metrics, detail, |_| "metrics".into());
    output::print_output(&out, global.quiet);
    Ok(())
}
