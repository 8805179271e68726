#[macro_use]
extern crate rocket;

mod configuration;
mod content;
mod countdown;
#[cfg(test)]
mod test_helpers;
mod webserver;

use configuration::ConfigurationManager;

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    let configuration = ConfigurationManager::from_environment();

    webserver::rocket_server(configuration).launch().await?;

    Ok(())
}
