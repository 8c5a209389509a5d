mod command;
mod config;
mod logging;
mod table;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
