use haunted_house::{Config, run};

fn main() -> anyhow::Result<()> {
    run(Config::from_env()?)
}
