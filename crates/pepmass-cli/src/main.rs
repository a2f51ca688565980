use pepmass_cli::input::{command, Input};
use pepmass_cli::runner::Runner;
use rayon::ThreadPoolBuilder;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::default()
        .filter_level(log::LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("PEPMASS_LOG", "error,pepmass=info"))
        .init();

    let matches = command().get_matches();

    let threads = matches
        .get_one::<u16>("threads")
        .copied()
        .map(usize::from)
        .unwrap_or_else(num_cpus::get);

    ThreadPoolBuilder::new().num_threads(threads).build_global()?;

    let search = Input::from_arguments(&matches).and_then(Input::build)?;

    if matches.get_flag("print-parameters") {
        println!("{}", serde_json::to_string_pretty(&search)?);
        return Ok(());
    }

    Runner::new(search)?.run()?;
    Ok(())
}
