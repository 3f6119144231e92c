use std::time::Instant;

use log::info;

use tsp_stages_core::{PointTable, Result, RunOptions, logging, solve, write_result};

fn main() -> Result<()> {
    let now = Instant::now();
    let options = RunOptions::from_args()?;
    logging::init_logger(&options)?;

    info!("options: {options}");

    let table = PointTable::read(options.input_path())?;
    info!("input: {table}");

    let points = table.select(options.selection().as_slice())?;
    let result = solve(&points, &options.request())?;

    write_result(&result, options.format, options.output_path())?;

    info!(
        "output: algorithm={} stops={} stages={} time={:.3}s",
        result.algorithm(),
        result.tour().len(),
        result.stage_count(),
        now.elapsed().as_secs_f32()
    );

    Ok(())
}
