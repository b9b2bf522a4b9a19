#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]
#![deny(clippy::unused_async)]

#[macro_use]
mod environment;

use environment::RealEnvironment;
use environment::RealEnvironmentOptions;
use run_cli::AppError;
use tokio_util::sync::CancellationToken;

mod app_state;
mod arg_parser;
mod commands;
mod configuration;
mod conflicts;
mod host;
mod pipeline;
mod run_cli;
mod utils;

#[cfg(test)]
mod test_helpers;

fn main() {
  let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
  rt.block_on(async move {
    match run().await {
      Ok(_) => {}
      Err(err) => {
        let result = format!("{:#}", err.inner);
        #[allow(clippy::print_stderr)]
        if !result.is_empty() {
          eprintln!("{}", result);
        }
        std::process::exit(err.exit_code);
      }
    }
  });
}

async fn run() -> Result<(), AppError> {
  let args = arg_parser::parse_args(std::env::args().collect())?;

  let environment = RealEnvironment::new(RealEnvironmentOptions {
    is_verbose: args.verbose,
    is_stdout_machine_readable: args.is_stdout_machine_readable(),
  });
  let token = CancellationToken::new();
  let ctrl_c_task = tokio::spawn({
    let token = token.clone();
    async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        token.cancel();
      }
    }
  });

  let result = run_cli::run_cli(&args, &environment, &token).await;
  ctrl_c_task.abort();
  Ok(result?)
}
