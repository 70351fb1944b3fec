use maze_core::{router, Difficulty, Maze, Mode, RouteState, Step, MAX_DIM, MIN_DIM};
use maze_host::render::render;
use maze_host::{fingerprint, HostConfig, MazeRepository, SaveMode};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

const DEFAULT_DIM: usize = 10;

fn main() {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let config = HostConfig::from_env();
    let mut repository = match MazeRepository::open(&config.store_dir) {
        Ok(repository) => repository,
        Err(e) => {
            eprintln!("❌ Error opening maze store {}: {}", config.store_dir.display(), e);
            std::process::exit(1);
        }
    };

    let command = args[1].as_str();
    let (positional, flags) = split_flags(&args[2..]);

    let result = match command {
        "new" => new_command(&mut repository, &positional, &flags),
        "generate" => generate_command(&mut repository, &positional, &flags),
        "show" => show_command(&repository, &positional),
        "solve" => solve_command(&repository, &config, &positional, &flags),
        "list" => list_command(&repository),
        "delete" => delete_command(&mut repository, &positional),
        "resize" => resize_command(&mut repository, &positional),
        "export" => export_command(&repository, &positional),
        "import" => import_command(&mut repository, &positional),
        _ => {
            eprintln!("❌ Unknown command: {}", command);
            print_usage(&args[0]);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command> [options]", program);
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  new <name> [--dim <n>] [--difficulty <d>]");
    eprintln!("      Save an empty (all open) maze");
    eprintln!("  generate <name> [--dim <n>] [--difficulty <d>] [--seed <s>] [--overwrite]");
    eprintln!("      Carve a random solvable maze and save it");
    eprintln!("      - difficulty: easy|medium|hard (default: easy)");
    eprintln!("      - seed: Integer seed, defaults to the clock");
    eprintln!("  show <name>");
    eprintln!("      Print a saved maze");
    eprintln!("  solve <name> [--animate]");
    eprintln!("      Find the shortest route; --animate prints every search round");
    eprintln!("  list");
    eprintln!("  delete <name>");
    eprintln!("  resize <name> <dim>");
    eprintln!("  export <name> <file>");
    eprintln!("  import <file>");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  MAZE_STORE_DIR  directory of saved mazes (default: ./mazes)");
    eprintln!("  MAZE_TICK_MS    delay between animated rounds (default: 60)");
    eprintln!("  RUST_LOG        log filter (default: info)");
}

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Separate `--flag value` pairs and bare `--switch`es from positional arguments.
fn split_flags(args: &[String]) -> (Vec<String>, HashMap<String, Option<String>>) {
    const SWITCHES: [&str; 2] = ["--animate", "--overwrite"];

    let mut positional = Vec::new();
    let mut flags = HashMap::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if SWITCHES.contains(&arg.as_str()) {
            flags.insert(arg.clone(), None);
        } else if arg.starts_with("--") {
            flags.insert(arg.clone(), iter.next().cloned());
        } else {
            positional.push(arg.clone());
        }
    }
    (positional, flags)
}

fn flag_value<'a>(flags: &'a HashMap<String, Option<String>>, name: &str) -> Result<Option<&'a str>, String> {
    match flags.get(name) {
        None => Ok(None),
        Some(Some(value)) => Ok(Some(value.as_str())),
        Some(None) => Err(format!("{} requires a value", name)),
    }
}

fn required<'a>(positional: &'a [String], index: usize, what: &str) -> Result<&'a str, String> {
    positional
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing required argument <{}>", what))
}

fn parse_dim(raw: &str) -> Result<usize, String> {
    let dim: usize = raw
        .parse()
        .map_err(|_| format!("Invalid dimension '{}'. Must be a positive integer.", raw))?;
    if !(MIN_DIM..=MAX_DIM).contains(&dim) {
        return Err(format!("Dimension must be between {} and {}", MIN_DIM, MAX_DIM));
    }
    Ok(dim)
}

fn maze_settings(flags: &HashMap<String, Option<String>>) -> Result<(usize, Difficulty), String> {
    let dim = flag_value(flags, "--dim")?.map(parse_dim).transpose()?.unwrap_or(DEFAULT_DIM);
    let difficulty = flag_value(flags, "--difficulty")?
        .map(str::parse::<Difficulty>)
        .transpose()?
        .unwrap_or_default();
    Ok((dim, difficulty))
}

fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.subsec_nanos() ^ elapsed.as_secs() as u32)
        .unwrap_or(1)
}

fn new_command(
    repository: &mut MazeRepository,
    positional: &[String],
    flags: &HashMap<String, Option<String>>,
) -> CommandResult {
    let name = required(positional, 0, "name")?;
    let (dim, difficulty) = maze_settings(flags)?;

    let maze = Maze::new(name, dim, difficulty)?;
    let key = repository.save(&maze, SaveMode::New)?;
    println!("💾 Saved empty {}x{} maze '{}' (key {})", dim, dim, name, key);
    Ok(())
}

fn generate_command(
    repository: &mut MazeRepository,
    positional: &[String],
    flags: &HashMap<String, Option<String>>,
) -> CommandResult {
    let name = required(positional, 0, "name")?;
    let (dim, difficulty) = maze_settings(flags)?;
    let seed = match flag_value(flags, "--seed")? {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| format!("Invalid seed '{}'. Must be a positive integer.", raw))?,
        None => clock_seed(),
    };
    let mode = if flags.contains_key("--overwrite") {
        SaveMode::Overwrite
    } else {
        SaveMode::New
    };

    println!("📋 Generating maze '{}'", name);
    println!("  Size: {}x{}", dim, dim);
    println!("  Difficulty: {}", difficulty);
    println!("  Seed: {}", seed);
    println!();

    let start = Instant::now();
    let mut maze = Maze::new(name, dim, difficulty)?;
    let stats = maze.randomize(seed)?;
    println!("  Generation time: {:.2}ms", start.elapsed().as_secs_f64() * 1000.0);
    println!(
        "  Root path: {} cells, branches: {} cells, backtracks: {}",
        stats.root_path_len, stats.branch_cells, stats.backtracks
    );
    println!();
    print!("{}", render(&maze));
    println!();

    let key = repository.save(&maze, mode)?;
    println!("💾 Maze saved (key {})", key);
    Ok(())
}

fn show_command(repository: &MazeRepository, positional: &[String]) -> CommandResult {
    let name = required(positional, 0, "name")?;
    let maze = repository.load(name)?;
    println!(
        "📦 {} ({}x{}, {}, key {})",
        maze.name,
        maze.dim(),
        maze.dim(),
        maze.difficulty,
        fingerprint(&maze)
    );
    print!("{}", render(&maze));
    Ok(())
}

fn solve_command(
    repository: &MazeRepository,
    config: &HostConfig,
    positional: &[String],
    flags: &HashMap<String, Option<String>>,
) -> CommandResult {
    let name = required(positional, 0, "name")?;
    let mut maze = repository.load(name)?;
    maze.clear_trace();

    let outcome = if flags.contains_key("--animate") {
        animate_search(&maze, config)?
    } else {
        match router::find_path(maze.grid(), maze.start(), maze.end(), Mode::Corridor)? {
            Some(path) => Step::Reached { path },
            None => Step::Exhausted,
        }
    };

    match outcome {
        Step::Reached { path } => {
            maze.mark_path(&path);
            print!("{}", render(&maze));
            println!();
            println!("✅ Solved in {} moves", path.len() - 1);
        }
        _ => {
            print!("{}", render(&maze));
            println!();
            println!("❌ No route from start to end");
        }
    }
    Ok(())
}

/// Drive the stepwise router one round per tick, printing the best path to
/// the node expanded in each round.
fn animate_search(maze: &Maze, config: &HostConfig) -> Result<Step, Box<dyn std::error::Error>> {
    let mut state = RouteState::new(maze.grid(), maze.start(), maze.end(), Mode::Corridor)?;
    loop {
        let current = match router::step(maze.grid(), &mut state)? {
            Step::Expanded { current } => current,
            finished => {
                println!("  Search finished after {} rounds", state.rounds());
                return Ok(finished);
            }
        };

        let mut frame = maze.clone();
        frame.mark_path(&state.path_to(current));
        println!("Round {} (frontier {}):", state.rounds(), state.frontier().len());
        print!("{}", render(&frame));
        println!();
        std::thread::sleep(config.tick);
    }
}

fn list_command(repository: &MazeRepository) -> CommandResult {
    if repository.is_empty() {
        println!("No saved mazes in {}", repository.root().display());
        return Ok(());
    }
    println!("📦 {} saved mazes:", repository.len());
    for name in repository.list() {
        println!("  {}", name);
    }
    Ok(())
}

fn delete_command(repository: &mut MazeRepository, positional: &[String]) -> CommandResult {
    let name = required(positional, 0, "name")?;
    repository.delete(name)?;
    println!("🗑  Deleted '{}'", name);
    Ok(())
}

fn resize_command(repository: &mut MazeRepository, positional: &[String]) -> CommandResult {
    let name = required(positional, 0, "name")?;
    let dim = parse_dim(required(positional, 1, "dim")?)?;

    let mut maze = repository.load(name)?;
    maze.resize(dim)?;
    let key = repository.save(&maze, SaveMode::Overwrite)?;
    println!("💾 Resized '{}' to {}x{} (key {})", name, dim, dim, key);
    print!("{}", render(&maze));
    Ok(())
}

fn export_command(repository: &MazeRepository, positional: &[String]) -> CommandResult {
    let name = required(positional, 0, "name")?;
    let file = required(positional, 1, "file")?;
    repository.export(name, Path::new(file))?;
    println!("💾 Maze '{}' exported to {}", name, file);
    Ok(())
}

fn import_command(repository: &mut MazeRepository, positional: &[String]) -> CommandResult {
    let file = required(positional, 0, "file")?;
    let name = repository.import(Path::new(file))?;
    println!("📦 Imported maze '{}'", name);
    Ok(())
}
