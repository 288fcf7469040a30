//TODO: update clap to remove the need for this
#![allow(dangerous_implicit_autorefs)]

use std::env;
use std::ffi::OsString;

use clap::{
    crate_description, crate_name, crate_version, App, AppSettings, Arg, SubCommand,
};
use cmb::{create, extract, list};

/// Map the slash switches of the original Windows tool onto subcommands
fn translate_legacy(mut args: Vec<OsString>) -> Vec<OsString> {
    let subcommand = match args.get(1).and_then(|arg| arg.to_str()) {
        Some("/c") | Some("/C") => "create",
        Some("/d") | Some("/D") => "extract",
        Some("/?") => "--help",
        _ => return args,
    };
    args[1] = OsString::from(subcommand);
    args
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let arg_archive = Arg::with_name("archive")
        .help("CMB archive file")
        .required(true)
        .value_name("FILE");

    let matches = App::new(crate_name!())
        .about(crate_description!())
        .version(crate_version!())
        .after_help("The legacy forms '/c DIR [OUTDIR]', '/d FILE [BASEDIR]' and '/?' are also accepted.")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("create")
                .about("Pack a directory and its immediate subdirectories into <DIR name>.cmb")
                .arg(
                    Arg::with_name("dir")
                        .help("Directory containing .txd files")
                        .required(true)
                        .value_name("DIR"),
                )
                .arg(
                    Arg::with_name("outdir")
                        .help("Directory to write the archive to (defaults to '.')")
                        .value_name("OUTDIR")
                        .default_value("."),
                ),
        )
        .subcommand(
            SubCommand::with_name("extract")
                .about("Unpack an archive, recreating its directory structure")
                .arg(&arg_archive)
                .arg(
                    Arg::with_name("basedir")
                        .help("Directory to unpack to (defaults to '.')")
                        .value_name("BASEDIR")
                        .default_value("."),
                ),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("List the entries of an archive")
                .arg(&arg_archive),
        )
        .get_matches_from(translate_legacy(env::args_os().collect()));

    if let Some(matches) = matches.subcommand_matches("create") {
        create(
            matches.value_of("dir").unwrap(),
            matches.value_of("outdir").unwrap(),
        )?;
    } else if let Some(matches) = matches.subcommand_matches("extract") {
        extract(
            matches.value_of("archive").unwrap(),
            matches.value_of("basedir").unwrap(),
        )?;
    } else if let Some(matches) = matches.subcommand_matches("list") {
        list(matches.value_of("archive").unwrap())?;
    }
    Ok(())
}
