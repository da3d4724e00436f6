use byond_mirror_lib::cli::{parse_args, resolve_command, run_mirror_command};
use byond_mirror_lib::error::MirrorError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), MirrorError> {
    color_eyre::install()?;

    let args = parse_args()?;
    let params = resolve_command(args.command)?;

    run_mirror_command(params).await?;

    Ok(())
}
