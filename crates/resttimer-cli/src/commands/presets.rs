use resttimer_core::Config;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    println!("{}", serde_json::to_string_pretty(&config.presets())?);
    Ok(())
}
