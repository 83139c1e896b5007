use clap::{App, Arg};
use icoforge::{
    EncodingMode, Error, IcoAssembler, LinearResampler, PixelBuffer,
};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::fs::File;
use std::process;

//===========================================================================//

fn main() {
    let matches = App::new("icoforge")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a multi-size Windows ICO file from a source image")
        .arg(
            Arg::with_name("image")
                .required(true)
                .value_name("IMAGE")
                .help("Source image path"),
        )
        .arg(
            Arg::with_name("output")
                .takes_value(true)
                .value_name("PATH")
                .short("o")
                .long("output")
                .help("Sets output path (default: icon.ico)"),
        )
        .arg(
            Arg::with_name("png")
                .long("png")
                .help("Embeds each rendition as a PNG instead of a bitmap"),
        )
        .arg(
            Arg::with_name("sizes")
                .takes_value(true)
                .use_delimiter(true)
                .value_name("SIZES")
                .long("sizes")
                .help("Comma-separated square sizes (default: 16,32,48,256)"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enables debug logging"),
        )
        .get_matches();

    let level = if matches.is_present("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    if let Err(error) = run(&matches) {
        log::error!("{}", error);
        process::exit(1);
    }
}

fn run(matches: &clap::ArgMatches) -> Result<(), Error> {
    let image_path = matches.value_of("image").unwrap();
    let out_path = matches.value_of("output").unwrap_or("icon.ico");
    let mode = if matches.is_present("png") {
        EncodingMode::Png
    } else {
        EncodingMode::Bitmap
    };
    let assembler = match matches.values_of("sizes") {
        Some(values) => {
            let mut sizes = Vec::new();
            for value in values {
                match value.parse::<u32>() {
                    Ok(size) => sizes.push(size),
                    Err(_) => {
                        eprintln!("invalid size {:?} in --sizes", value);
                        process::exit(1);
                    }
                }
            }
            IcoAssembler::with_sizes(mode, sizes)
        }
        None => IcoAssembler::new(mode),
    };

    let source = PixelBuffer::open(image_path)?;
    log::info!(
        "decoded {} ({}x{})",
        image_path,
        source.width(),
        source.height()
    );
    let icondir = assembler.assemble(&source, &LinearResampler)?;
    let file = File::create(out_path).map_err(Error::WriteFailed)?;
    icondir.write(file)?;
    log::info!(
        "wrote {} ({} renditions)",
        out_path,
        icondir.entries().len()
    );
    Ok(())
}

//===========================================================================//
