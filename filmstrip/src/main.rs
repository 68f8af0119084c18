use anyhow::{bail, Context, Result};
use argh::FromArgs;
use filmstrip_lib::{
    decode, encode_with_stats, export_json, import_json, library_from_json, Delay, ExportJob,
    ExportParams, FrameStack, MemoryLibrary, Playback, Progress, Source,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

#[derive(FromArgs)]
/// Pixel-art animation projects: pack, inspect and export them as GIFs.
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Pack(PackArgs),
    Unpack(UnpackArgs),
    Info(InfoArgs),
    Gif(GifArgs),
    Merge(MergeArgs),
}

#[derive(FromArgs)]
/// Encode a directory of images (one per frame) into a project file.
#[argh(subcommand, name = "pack")]
struct PackArgs {
    #[argh(positional)]
    /// directory holding the frames, in file name order
    dir: PathBuf,

    #[argh(option, short = 'o')]
    /// project file to write
    output: PathBuf,
}

#[derive(FromArgs)]
/// Decode a project file into one PNG per frame.
#[argh(subcommand, name = "unpack")]
struct UnpackArgs {
    #[argh(positional)]
    /// project file to read
    project: PathBuf,

    #[argh(positional)]
    /// directory to write the frames to
    dir: PathBuf,
}

#[derive(FromArgs)]
/// Describe a project file.
#[argh(subcommand, name = "info")]
struct InfoArgs {
    #[argh(positional)]
    /// project file to read
    project: PathBuf,
}

#[derive(FromArgs)]
/// Export a project file as an animated GIF.
#[argh(subcommand, name = "gif")]
struct GifArgs {
    #[argh(positional)]
    /// project file to read
    project: PathBuf,

    #[argh(option, short = 'o')]
    /// GIF file to write
    output: PathBuf,

    #[argh(option)]
    /// JSON file with export parameters
    config: Option<PathBuf>,

    #[argh(option)]
    /// output pixels per source pixel, horizontally
    scale_x: Option<u32>,

    #[argh(option)]
    /// output pixels per source pixel, vertically
    scale_y: Option<u32>,

    #[argh(option)]
    /// frames per second
    fps: Option<u32>,

    #[argh(switch)]
    /// play the animation once instead of looping
    once: bool,
}

#[derive(FromArgs)]
/// Merge a JSON archive into a JSON library, renaming colliding saves.
#[argh(subcommand, name = "merge")]
struct MergeArgs {
    #[argh(positional)]
    /// library to update (created when missing)
    library: PathBuf,

    #[argh(positional)]
    /// archive to import
    incoming: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Args = argh::from_env();

    match args.command {
        Command::Pack(args) => pack(&args),
        Command::Unpack(args) => unpack(&args),
        Command::Info(args) => info(&args),
        Command::Gif(args) => gif(&args),
        Command::Merge(args) => merge(&args),
    }
}

fn load(path: &Path) -> Result<FrameStack> {
    let bytes =
        fs::read(path).with_context(|| format!("Couldn't read project: {}", path.display()))?;

    let frames =
        decode(&bytes).with_context(|| format!("Couldn't decode project: {}", path.display()))?;

    FrameStack::from_frames(frames).context("Couldn't build animation")
}

fn pack(args: &PackArgs) -> Result<()> {
    let stack = Source::from_dir(&args.dir)
        .context("Couldn't load frames")?
        .into_stack()?;

    let Some((stats, bytes)) = encode_with_stats(stack.frames())? else {
        bail!("Nothing to encode");
    };

    fs::write(&args.output, bytes)
        .with_context(|| format!("Couldn't write project: {}", args.output.display()))?;

    eprintln!("{}", stats);

    Ok(())
}

fn unpack(args: &UnpackArgs) -> Result<()> {
    let stack = load(&args.project)?;

    fs::create_dir_all(&args.dir)
        .with_context(|| format!("Couldn't create directory: {}", args.dir.display()))?;

    for (idx, frame) in stack.frames().iter().enumerate() {
        let path = args.dir.join(format!("frame-{:04}.png", idx + 1));

        frame
            .image()
            .save(&path)
            .with_context(|| format!("Couldn't write frame: {}", path.display()))?;
    }

    eprintln!("(wrote {} frames)", stack.len());

    Ok(())
}

fn info(args: &InfoArgs) -> Result<()> {
    let stack = load(&args.project)?;
    let (width, height) = stack.dimensions();

    let Some((stats, _)) = encode_with_stats(stack.frames())? else {
        bail!("Project has no frames");
    };

    println!("{}x{}, {}", width, height, stats);

    for (idx, changes) in stats.changes.iter().enumerate() {
        println!("  frame {:>4}: {} change(s)", idx + 1, changes);
    }

    Ok(())
}

struct Bar(ProgressBar);

impl Progress for Bar {
    fn frame_done(&self, done: usize, _: usize) {
        self.0.set_position(done as u64);
    }
}

fn export_params(args: &GifArgs) -> Result<ExportParams> {
    let mut params = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Couldn't read config: {}", path.display()))?;

            serde_json::from_str(&json)
                .with_context(|| format!("Couldn't parse config: {}", path.display()))?
        }
        None => ExportParams::default(),
    };

    if let Some(scale_x) = args.scale_x {
        params.scale_x = scale_x;
    }

    if let Some(scale_y) = args.scale_y {
        params.scale_y = scale_y;
    }

    if let Some(fps) = args.fps {
        params.delay = Delay::from_fps(fps);
    }

    if args.once {
        params.playback = Playback::Once;
    }

    Ok(params)
}

fn gif(args: &GifArgs) -> Result<()> {
    let stack = load(&args.project)?;
    let params = export_params(args)?;

    let partial = args.output.with_extension("gif.part");
    let sink = File::create(&partial)
        .with_context(|| format!("Couldn't create file: {}", partial.display()))?;

    let bar = ProgressBar::new(stack.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{spinner} [{bar:40}] {pos}/{len} frames",
    )?);

    let job = ExportJob::spawn(
        stack.snapshot(),
        params,
        BufWriter::new(sink),
        Bar(bar.clone()),
    );

    let result = job.join();
    bar.finish_and_clear();

    match result {
        Ok(sink) => drop(sink),
        Err(err) => {
            let _ = fs::remove_file(&partial);
            return Err(err).context("Couldn't export GIF");
        }
    }

    fs::rename(&partial, &args.output)
        .with_context(|| format!("Couldn't write GIF: {}", args.output.display()))?;

    eprintln!("(exported {} frames)", stack.len());

    Ok(())
}

fn merge(args: &MergeArgs) -> Result<()> {
    let mut library = if args.library.exists() {
        let json = fs::read_to_string(&args.library)
            .with_context(|| format!("Couldn't read library: {}", args.library.display()))?;

        library_from_json(&json)
            .with_context(|| format!("Couldn't parse library: {}", args.library.display()))?
    } else {
        MemoryLibrary::new()
    };

    let incoming = fs::read_to_string(&args.incoming)
        .with_context(|| format!("Couldn't read archive: {}", args.incoming.display()))?;

    let report = import_json(&mut library, &incoming)
        .with_context(|| format!("Couldn't import archive: {}", args.incoming.display()))?;

    fs::write(&args.library, export_json(&library)?)
        .with_context(|| format!("Couldn't write library: {}", args.library.display()))?;

    eprintln!("{:#?}", report);

    Ok(())
}
