use std::path::PathBuf;

use clap::Parser;

use aribts::analyzer;

#[derive(Parser)]
#[command(name = "aribts-cli", about = "Decode PSI/SI from a stored MPEG-TS file")]
struct Opt {
    /// Path to the .ts / .m2ts recording
    path: PathBuf,

    /// Print the full JSON report instead of the one-line summary
    #[clap(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::parse();

    let analysis = analyzer::analyze_file(&opt.path)?;
    let report = analysis.report();

    if opt.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "unit_size={} programs={} services={} events={} tables={} crc_errors={} drops={}",
            report.unit_size,
            report.programs.len(),
            report.services.len(),
            report.events,
            report.stats.tables_decoded,
            report.stats.section_errors,
            report.stats.continuity_drops,
        );
    }
    Ok(())
}
