pub mod cli;
pub mod cmd;
pub mod error;
pub mod io;

pub use cli::{Cli, Command, DEFAULT_MAX_INPUT_SIZE, PathOrStdin, ResolveField};

use clap::Parser;
use datadict_core::ValidatorOptions;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = dispatch(&cli) {
        eprintln!("{}", e.message());
        std::process::exit(e.exit_code());
    }
}

/// Dispatches the parsed CLI arguments to the appropriate command handler.
///
/// Returns `Ok(())` on success or a [`error::CliError`] on failure. The
/// caller prints the error message and exits with the associated code.
fn dispatch(cli: &Cli) -> Result<(), error::CliError> {
    match &cli.command {
        Command::Validate {
            dictionary,
            input,
            descriptor,
            zip,
            resolve,
            expect_terms,
            expect_type,
            allow_default_namespace,
            resolve_field,
            language,
            no_cache,
            cache_missing,
        } => {
            let dictionary_content = io::read_file(dictionary, cli.max_input_size)?;
            let input_content = io::read_input(input, cli.max_input_size)?;
            let options = ValidatorOptions {
                zip: *zip,
                cache: !*no_cache,
                cache_missing: *cache_missing,
                expect_terms: *expect_terms,
                expect_type: *expect_type,
                resolve: *resolve,
                allow_default_namespace: *allow_default_namespace,
                resolve_field: (*resolve_field).into(),
                language: language.clone(),
            };
            cmd::validate::run(
                &dictionary_content,
                &input_content,
                descriptor.as_deref(),
                options,
            )
        }

        Command::Compare { original, updated } => {
            let original_content = io::read_input(original, cli.max_input_size)?;
            let updated_content = io::read_input(updated, cli.max_input_size)?;
            cmd::compare::run(&original_content, &updated_content)
        }
    }
}
