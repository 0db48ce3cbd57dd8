// main.rs      progif command
//
// Copyright (c) 2019-2025  Douglas Lau
//
#![forbid(unsafe_code)]

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use progif::block::DisposalMethod;
use progif::{
    Animation, Bitmap, Decoded, Decoder, Frame, Progress, RasterAllocator,
};
use std::error::Error;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufWriter, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &str = std::env!("CARGO_PKG_VERSION");

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stdout(ColorChoice::Always);
    match create_app().get_matches().subcommand() {
        ("show", Some(matches)) => show(&mut out, matches)?,
        ("ppm", Some(matches)) => ppm(matches)?,
        _ => unreachable!(),
    }
    out.reset()?;
    Ok(())
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    let chunk = Arg::with_name("chunk")
        .long("chunk")
        .takes_value(true)
        .value_name("bytes")
        .help("feed data to the decoder in chunks");
    App::new("progif")
        .version(VERSION)
        .setting(AppSettings::GlobalVersion)
        .about("Progressive GIF decoder")
        .setting(AppSettings::ArgRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("show")
                .about("Show GIF frame table")
                .arg(chunk.clone())
                .arg(
                    Arg::with_name("files")
                        .required(true)
                        .min_values(1)
                        .help("input file(s)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("ppm")
                .about("Write composited frames as a PPM image stream")
                .arg(chunk)
                .arg(
                    Arg::with_name("frame")
                        .long("frame")
                        .takes_value(true)
                        .value_name("number")
                        .help("write only one frame"),
                )
                .arg(Arg::with_name("file").required(true).help("input file"))
                .arg(
                    Arg::with_name("output")
                        .required(true)
                        .help("output file"),
                ),
        )
}

/// Get chunk size argument
fn chunk_size(matches: &ArgMatches) -> Result<usize, Box<dyn Error>> {
    match matches.value_of("chunk") {
        Some(c) => Ok(c.parse::<usize>()?.max(1)),
        None => Ok(usize::MAX),
    }
}

/// Decoded animation with its data
struct Loaded {
    data: Vec<u8>,
    anim: Animation,
    results: Vec<Result<Decoded, progif::Error>>,
    error: Option<progif::Error>,
}

/// Load a GIF file, feeding it to the decoder in chunks.
///
/// Frames are decoded as soon as all their data is available.
fn load(path: &OsStr, chunk: usize) -> Result<Loaded, Box<dyn Error>> {
    let data = std::fs::read(path)?;
    let mut anim = Decoder::new(RasterAllocator::default()).into_animation();
    let mut results = vec![];
    let mut error = None;
    let mut len: usize = 0;
    loop {
        len = len.saturating_add(chunk).min(data.len());
        let buf = &data[..len];
        let progress = anim.initialise(buf);
        while results.len() < anim.frame_count() {
            results.push(anim.decode_frame(buf, results.len()));
        }
        match progress {
            Ok(Progress::Complete) => break,
            Ok(Progress::NeedData) => (),
            Err(e) => {
                error = Some(e);
                break;
            }
        }
        if len == data.len() {
            break;
        }
    }
    Ok(Loaded {
        data,
        anim,
        results,
        error,
    })
}

/// Handle show subcommand
fn show(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let chunk = chunk_size(matches)?;
    if let Some(values) = matches.values_of_os("files") {
        for path in values {
            show_file(out, path, chunk)?;
        }
    }
    Ok(())
}

/// Show one GIF file
fn show_file(
    out: &mut StandardStream,
    path: &OsStr,
    chunk: usize,
) -> Result<(), Box<dyn Error>> {
    let mut magenta = ColorSpec::new();
    magenta.set_fg(Some(Color::Magenta));
    let mut red = ColorSpec::new();
    red.set_fg(Some(Color::Red)).set_intense(true);
    let mut yellow = ColorSpec::new();
    yellow.set_fg(Some(Color::Yellow)).set_intense(true);
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    let loaded = load(path, chunk)?;
    let anim = &loaded.anim;
    out.set_color(&magenta)?;
    writeln!(out, "{:?}", path)?;
    let Some(header) = anim.header() else {
        out.set_color(&red)?;
        match &loaded.error {
            Some(e) => writeln!(out, "no header: {}", e)?,
            None => writeln!(out, "no header!")?,
        }
        return Ok(());
    };
    let gif = String::from_utf8_lossy(&header.version()).to_string();
    let width = anim.width();
    let height = anim.height();
    let frame_digits = digits(anim.frame_count_partial()).max(3);
    let size_digits = 4.max(1 + digits(width) + digits(height));
    out.set_color(&bold)?;
    write!(
        out,
        "GIF{}, {}x{}, frames: {}",
        gif,
        width,
        height,
        anim.frame_count()
    )?;
    write!(out, ", repeat: ")?;
    match anim.loop_count() {
        0 => writeln!(out, "∞")?,
        c => writeln!(out, "{}", c)?,
    }
    out.set_color(&yellow)?;
    write!(out, " {:>w$}", "Fr#", w = frame_digits)?;
    write!(out, "  Delay Disp")?;
    write!(out, " {:>w$}", "Size", w = size_digits)?;
    write!(out, " {:>w$}", "X,Y", w = size_digits)?;
    writeln!(out, " Clrs Trn Result")?;
    let global_clr = anim
        .screen_desc()
        .map_or(0, |d| d.color_table_config().len());
    for (n, frame) in anim.frames().iter().enumerate() {
        let result = loaded.results.get(n);
        show_frame(
            out,
            frame,
            result,
            (width, height),
            global_clr,
            n,
            (frame_digits, size_digits),
        )?;
    }
    if let Some(e) = &loaded.error {
        out.set_color(&red)?;
        writeln!(
            out,
            "error: {} @ {} of {} bytes",
            e,
            anim.buffer_position(),
            loaded.data.len()
        )?;
    }
    Ok(())
}

/// Show one frame of a GIF file
fn show_frame(
    out: &mut StandardStream,
    frame: &Frame,
    result: Option<&Result<Decoded, progif::Error>>,
    (width, height): (u32, u32),
    global_clr: usize,
    number: usize,
    (frame_digits, size_digits): (usize, usize),
) -> Result<(), Box<dyn Error>> {
    let mut dflt = ColorSpec::new();
    dflt.set_fg(Some(Color::White));
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    let mut red = ColorSpec::new();
    red.set_fg(Some(Color::Red)).set_intense(true);
    let mut green = ColorSpec::new();
    green.set_fg(Some(Color::Green)).set_intense(true);
    let desc = frame.image_desc();
    out.set_color(&dflt)?;
    let interlaced = if desc.interlaced() { 'i' } else { ' ' };
    write!(out, "{}", interlaced)?;
    out.set_color(&bold)?;
    write!(out, "{:>w$}", number, w = frame_digits)?;
    let d = frame.delay_time_cs();
    if d == 0 {
        out.set_color(&dflt)?;
    }
    write!(out, " {:6.2}", d as f32 / 100f32)?;
    let d = match frame.disposal_method() {
        DisposalMethod::NoAction => "none",
        DisposalMethod::Keep => "keep",
        DisposalMethod::Background => "bg",
        DisposalMethod::Previous => "prev",
    };
    out.set_color(if d == "none" { &dflt } else { &bold })?;
    write!(out, " {:>4}", d)?;
    let bounds = frame.bounds();
    if width == bounds.width && height == bounds.height {
        out.set_color(&dflt)?;
    } else {
        out.set_color(&bold)?;
    }
    write!(
        out,
        " {:>w$}",
        &format!("{}x{}", bounds.width, bounds.height),
        w = size_digits
    )?;
    if bounds.x == 0 && bounds.y == 0 {
        out.set_color(&dflt)?;
    } else {
        out.set_color(&bold)?;
    }
    write!(
        out,
        " {:>w$}",
        &format!("{},{}", bounds.x, bounds.y),
        w = size_digits
    )?;
    let c = desc.color_table_config().len();
    if c > 0 {
        out.set_color(&bold)?;
        write!(out, "  {:3}", c)?;
    } else {
        out.set_color(&dflt)?;
        write!(out, " {:3}g", global_clr)?;
    }
    match frame.transparent_color() {
        Some(tc) => {
            out.set_color(&bold)?;
            write!(out, " {:>3}", tc)?;
        }
        None => {
            out.set_color(&dflt)?;
            write!(out, " {:>3}", "-")?;
        }
    }
    match result {
        Some(Ok(Decoded::Complete)) => {
            out.set_color(&green)?;
            let opaque = if frame.opaque() { " opaque" } else { "" };
            writeln!(out, " ok{}", opaque)?;
        }
        Some(Ok(Decoded::Partial)) => {
            out.set_color(&bold)?;
            writeln!(out, " partial")?;
        }
        Some(Ok(Decoded::NoDisplay)) => {
            out.set_color(&dflt)?;
            writeln!(out, " -")?;
        }
        Some(Err(e)) => {
            out.set_color(&red)?;
            writeln!(out, " {}", e)?;
        }
        None => {
            out.set_color(&red)?;
            writeln!(out, " incomplete")?;
        }
    }
    Ok(())
}

/// Handle ppm subcommand
fn ppm(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let chunk = chunk_size(matches)?;
    let path = matches.value_of_os("file").ok_or("no input file")?;
    let output = matches.value_of_os("output").ok_or("no output file")?;
    let only = match matches.value_of("frame") {
        Some(n) => Some(n.parse::<usize>()?),
        None => None,
    };
    let mut loaded = load(path, chunk)?;
    if let Some(e) = &loaded.error {
        log::warn!("{:?}: {}", path, e);
    }
    let mut writer = BufWriter::new(File::create(output)?);
    let count = loaded.anim.frame_count_partial();
    for number in 0..count {
        if only.is_some_and(|n| n != number) {
            continue;
        }
        match loaded.anim.decode_frame(&loaded.data, number) {
            Ok(Decoded::Complete) | Ok(Decoded::Partial) => (),
            Ok(Decoded::NoDisplay) => continue,
            Err(e) => {
                log::warn!("frame {}: {}", number, e);
                if loaded.anim.dirty_frame() != Some(number) {
                    continue;
                }
            }
        }
        if let Some(bitmap) = loaded.anim.bitmap() {
            write_ppm(&mut writer, &loaded.anim, bitmap, number)?;
        }
    }
    if let Some(n) = only.filter(|n| *n >= count) {
        return Err(progif::Error::FrameOutOfRange(n).into());
    }
    writer.flush()?;
    Ok(())
}

/// Write one frame as a binary PPM image
fn write_ppm<W: Write>(
    writer: &mut W,
    anim: &Animation,
    bitmap: &dyn Bitmap,
    number: usize,
) -> Result<(), Box<dyn Error>> {
    let delay = anim.frame(number).map_or(0, |f| f.delay_time_cs());
    writeln!(writer, "P6")?;
    writeln!(writer, "# frame {}, delay {}cs", number, delay)?;
    writeln!(writer, "{} {}", anim.width(), anim.height())?;
    writeln!(writer, "255")?;
    for px in bitmap.buffer().chunks_exact(4) {
        writer.write_all(&px[..3])?;
    }
    Ok(())
}

/// Calculate digits in a number
fn digits<T: TryInto<usize>>(v: T) -> usize {
    let v = v.try_into().unwrap_or(usize::MAX);
    match v {
        0..=9 => 1,
        10..=99 => 2,
        100..=999 => 3,
        1000..=9999 => 4,
        _ => 5,
    }
}
