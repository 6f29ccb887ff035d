use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::error;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read};
use std::path::PathBuf;
use snake_grid_transformer::batch::write_csv;
use snake_grid_transformer::features::default_output_path;
use snake_grid_transformer::{
    process_coordinates, process_file, GridCode, GridFiles, InputFormat, TransformError,
};

fn grid_arg(name: &'static str, default: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .num_args(1)
        .default_value(default)
        .value_parser(|s: &str| s.parse::<GridCode>().map_err(|e| e.to_string()))
        .global(true)
        .help(help)
}

fn cli() -> Command {
    Command::new("Snake Grid Transformer")
        .version("1.0")
        .author("Jesper Fjellin")
        .about(
            "Transforms coordinates between British National Grid (27700) \
             and HS2 Snake Grid (9300)",
        )
        .subcommand_required(true)
        .arg(grid_arg("from", "27700", "Source grid EPSG code"))
        .arg(grid_arg("to", "9300", "Destination grid EPSG code"))
        .arg(
            Arg::new("grid-dir")
                .long("grid-dir")
                .num_args(1)
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help(
                    "Directory holding the NTv2 .gsb files \
                     (defaults to $SNAKE_GRID_GSB_DIR or ./gsb_files)",
                ),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(
            Command::new("file")
                .about("Transform every geometry in a GeoJSON file")
                .arg(Arg::new("input").required(true).index(1).help("Input GeoJSON file"))
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .num_args(1)
                        .help(
                            "Output GeoJSON file \
                             (defaults to output/transformed_<name>.geojson)",
                        ),
                ),
        )
        .subcommand(
            Command::new("coords")
                .about("Transform x,y coordinate lines read from a file or stdin")
                .arg(
                    Arg::new("input")
                        .short('i')
                        .long("input")
                        .num_args(1)
                        .help("Text file with one x,y pair per line (stdin if omitted)"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .num_args(1)
                        .help("Also write the transformed coordinates to this CSV file"),
                ),
        )
}

fn main() {
    let matches = cli().get_matches();

    let level = if matches.get_flag("verbose") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&matches) {
        error!("{}", e);
        if e.is_deployment_fault() {
            eprintln!(
                "Please ensure OSTN15_NTv2_OSGBtoETRS.gsb and HS2TN15_NTv2.gsb \
                 are deployed in the grid directory."
            );
        }
        std::process::exit(1);
    }
}

fn grid(matches: &ArgMatches, name: &str) -> Result<GridCode, TransformError> {
    matches
        .get_one::<GridCode>(name)
        .copied()
        .ok_or_else(|| TransformError::UnsupportedGridCode(String::new()))
}

fn run(matches: &ArgMatches) -> Result<(), TransformError> {
    let source = grid(matches, "from")?;
    let dest = grid(matches, "to")?;
    let grid_files = matches
        .get_one::<PathBuf>("grid-dir")
        .map(GridFiles::new)
        .unwrap_or_else(GridFiles::from_env);

    match matches.subcommand() {
        Some(("file", sub)) => {
            let input = sub
                .get_one::<String>("input")
                .map(PathBuf::from)
                .unwrap_or_default();
            if !input.exists() {
                return Err(TransformError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("File not found: {}", input.display()),
                )));
            }
            let output = sub
                .get_one::<String>("output")
                .map(PathBuf::from)
                .unwrap_or_else(|| default_output_path(&input));

            let count = process_file(
                &input,
                &output,
                InputFormat::GeoJSON,
                source,
                dest,
                &grid_files,
            )?;
            println!("Transformed {} features into {}", count, output.display());
        }
        Some(("coords", sub)) => {
            let text = match sub.get_one::<String>("input") {
                Some(path) => fs::read_to_string(path)?,
                None => {
                    let mut buffer = String::new();
                    io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };

            let rows = process_coordinates(&text, source, dest, &grid_files)?;
            println!("{:>16} {:>16}", "transformed_x", "transformed_y");
            for row in &rows {
                println!("{:>16} {:>16}", row.display_x(), row.display_y());
            }

            if let Some(path) = sub.get_one::<String>("output") {
                write_csv(&rows, BufWriter::new(File::create(path)?))?;
                println!("Wrote {} rows to {}", rows.len(), path);
            }
        }
        _ => unreachable!("clap enforces a subcommand"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_flags_accept_any_spelling_the_parser_does() {
        let matches = cli()
            .try_get_matches_from(["snake-grid-transformer", "--to", " epsg:27700", "coords"])
            .unwrap();
        assert_eq!(grid(&matches, "to").unwrap(), GridCode::BritishNationalGrid);
        assert_eq!(grid(&matches, "from").unwrap(), GridCode::BritishNationalGrid);
    }

    #[test]
    fn defaults_go_from_national_grid_to_snake_grid() {
        let matches = cli()
            .try_get_matches_from(["snake-grid-transformer", "file", "route.geojson"])
            .unwrap();
        assert_eq!(grid(&matches, "from").unwrap(), GridCode::BritishNationalGrid);
        assert_eq!(grid(&matches, "to").unwrap(), GridCode::Hs2SnakeGrid);
    }

    #[test]
    fn unknown_grid_is_rejected_with_the_grid_error() {
        let err = cli()
            .try_get_matches_from(["snake-grid-transformer", "--from", "4326", "coords"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(err.to_string().contains("Unsupported grid code: 4326"));
    }
}
