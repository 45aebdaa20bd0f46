use std::env;
use std::fs;

use ndstrans::formats::{Container, presets};
use ndstrans::{Error, Result};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let mut args = env::args().skip(1);
    let (Some(path), format) = (args.next(), args.next()) else {
        return Err(Error::Parse("usage: roundtrip <file> [format]"));
    };

    let data = fs::read(&path)?;
    let config = match format {
        Some(name) => presets::by_name(&name),
        None => presets::detect(&data),
    }
    .ok_or(Error::Parse("unknown format"))?;

    let mut container = Container::load(config, &data)?;
    for i in 0..container.tables().len() {
        let text = container.export(i)?;
        fs::write(format!("{path}.{i}.txt"), &text)?;
        container.import(i, &text)?;
    }

    let rebuilt = container.save()?;
    println!(
        "{}: {} tables, {} strings, rebuilt {} bytes ({})",
        config.name,
        container.tables().len(),
        container.tables().iter().map(|t| t.len()).sum::<usize>(),
        rebuilt.len(),
        if rebuilt == data { "identical" } else { "changed" },
    );

    Ok(())
}
