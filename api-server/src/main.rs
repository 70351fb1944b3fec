use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use maze_core::{router, Coord, Difficulty, GenerationStats, Maze, Mode, RouteState, Step, MAX_DIM, MIN_DIM};
use maze_host::{HostConfig, MazeRepository, RepositoryError, SaveMode};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

type Repository = web::Data<Mutex<MazeRepository>>;

// Request/Response types

#[derive(Debug, Deserialize)]
struct SaveMazeRequest {
    maze: Maze,
    #[serde(default)]
    overwrite: bool,
}

#[derive(Debug, Serialize)]
struct SaveMazeResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct MazeResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    maze: Option<Maze>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateMazeRequest {
    #[serde(default = "default_name")]
    name: String,
    dim: usize,
    #[serde(default)]
    difficulty: Difficulty,
    seed: u32,
}

fn default_name() -> String {
    "Generated Maze".to_string()
}

#[derive(Debug, Serialize)]
struct GenerateMazeResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    maze: Option<Maze>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<GenerationStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SolveRequest {
    maze: Maze,
}

#[derive(Debug, Serialize)]
struct SolveResponse {
    success: bool,
    solvable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<Vec<Coord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// One round of the stepwise router. Without `state` a new search starts at
/// `src` (default: the maze start) toward `dest` (default: the maze end).
#[derive(Debug, Deserialize)]
struct RouteStepRequest {
    maze: Maze,
    #[serde(default)]
    state: Option<RouteState>,
    #[serde(default)]
    src: Option<Coord>,
    #[serde(default)]
    dest: Option<Coord>,
    #[serde(default = "default_mode")]
    mode: Mode,
}

fn default_mode() -> Mode {
    Mode::Corridor
}

#[derive(Debug, Serialize)]
struct RouteStepResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<Step>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<RouteState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn status_for(error: &RepositoryError) -> StatusCode {
    match error {
        RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
        RepositoryError::NameTaken(_) | RepositoryError::KeyCollision { .. } => StatusCode::CONFLICT,
        RepositoryError::Unsolvable(_) | RepositoryError::Maze(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RepositoryError::Io(_) | RepositoryError::Serde(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// API Handlers

/// GET /api/mazes
/// List the names of all saved mazes
async fn list_mazes(repository: Repository) -> impl Responder {
    let Ok(repository) = repository.lock() else {
        return poisoned();
    };
    let names: Vec<&str> = repository.list().collect();
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "mazes": names
    }))
}

/// GET /api/mazes/{name}
async fn get_maze(repository: Repository, name: web::Path<String>) -> impl Responder {
    let result = match repository.lock() {
        Ok(repository) => repository.load(&name),
        Err(_) => return poisoned(),
    };

    match result {
        Ok(maze) => HttpResponse::Ok().json(MazeResponse {
            success: true,
            maze: Some(maze),
            error: None,
        }),
        Err(e) => {
            tracing::warn!("Failed to load maze '{}': {}", name, e);
            HttpResponse::build(status_for(&e)).json(MazeResponse {
                success: false,
                maze: None,
                error: Some(e.to_string()),
            })
        }
    }
}

/// DELETE /api/mazes/{name}
async fn delete_maze(repository: Repository, name: web::Path<String>) -> impl Responder {
    let result = match repository.lock() {
        Ok(mut repository) => repository.delete(&name),
        Err(_) => return poisoned(),
    };

    match result {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => {
            tracing::warn!("Failed to delete maze '{}': {}", name, e);
            HttpResponse::build(status_for(&e)).json(serde_json::json!({
                "success": false,
                "error": e.to_string()
            }))
        }
    }
}

/// POST /api/mazes
/// Save a maze; refused when it cannot be solved
async fn save_maze(repository: Repository, req: web::Json<SaveMazeRequest>) -> impl Responder {
    tracing::info!("Received save request for maze '{}' (overwrite: {})", req.maze.name, req.overwrite);

    let mode = if req.overwrite {
        SaveMode::Overwrite
    } else {
        SaveMode::New
    };
    let result = match repository.lock() {
        Ok(mut repository) => repository.save(&req.maze, mode),
        Err(_) => return poisoned(),
    };

    match result {
        Ok(key) => HttpResponse::Ok().json(SaveMazeResponse {
            success: true,
            key: Some(key),
            error: None,
        }),
        Err(e) => {
            tracing::error!("Failed to save maze '{}': {}", req.maze.name, e);
            HttpResponse::build(status_for(&e)).json(SaveMazeResponse {
                success: false,
                key: None,
                error: Some(e.to_string()),
            })
        }
    }
}

/// POST /api/generate
/// Carve a new random maze (not saved)
async fn generate_maze(req: web::Json<GenerateMazeRequest>) -> impl Responder {
    tracing::info!(
        "Received generate request: {}x{} {} seed {}",
        req.dim,
        req.dim,
        req.difficulty,
        req.seed
    );

    if !(MIN_DIM..=MAX_DIM).contains(&req.dim) {
        return HttpResponse::BadRequest().json(GenerateMazeResponse {
            success: false,
            maze: None,
            stats: None,
            error: Some(format!("dim must be between {} and {}", MIN_DIM, MAX_DIM)),
        });
    }

    let generated = Maze::new(req.name.clone(), req.dim, req.difficulty).and_then(|mut maze| {
        let stats = maze.randomize(req.seed)?;
        Ok((maze, stats))
    });

    match generated {
        Ok((maze, stats)) => HttpResponse::Ok().json(GenerateMazeResponse {
            success: true,
            maze: Some(maze),
            stats: Some(stats),
            error: None,
        }),
        Err(e) => {
            tracing::error!("Failed to generate maze: {}", e);
            HttpResponse::InternalServerError().json(GenerateMazeResponse {
                success: false,
                maze: None,
                stats: None,
                error: Some(e.to_string()),
            })
        }
    }
}

/// POST /api/solve
/// One-shot corridor route from start to end
async fn solve_maze(req: web::Json<SolveRequest>) -> impl Responder {
    if let Err(e) = req.maze.validate() {
        return HttpResponse::BadRequest().json(SolveResponse {
            success: false,
            solvable: false,
            path: None,
            error: Some(e.to_string()),
        });
    }

    let path = req.maze.solve();
    tracing::info!("Solved maze '{}': solvable={}", req.maze.name, path.is_some());
    HttpResponse::Ok().json(SolveResponse {
        success: true,
        solvable: path.is_some(),
        path,
        error: None,
    })
}

/// POST /api/route/step
/// Advance a stepwise search by exactly one round; the caller keeps the state
async fn route_step(req: web::Json<RouteStepRequest>) -> impl Responder {
    let req = req.into_inner();
    let grid = req.maze.grid();

    let state = req.maze.validate().and_then(|()| match req.state {
        Some(state) => Ok(state),
        None => RouteState::new(
            grid,
            req.src.unwrap_or(req.maze.start()),
            req.dest.unwrap_or(req.maze.end()),
            req.mode,
        ),
    });

    let outcome = state.and_then(|mut state| {
        let step = router::step(grid, &mut state)?;
        Ok((step, state))
    });

    match outcome {
        Ok((step, state)) => {
            tracing::debug!("Route step {}: {:?}", state.rounds(), step);
            HttpResponse::Ok().json(RouteStepResponse {
                success: true,
                step: Some(step),
                state: Some(state),
                error: None,
            })
        }
        Err(e) => HttpResponse::BadRequest().json(RouteStepResponse {
            success: false,
            step: None,
            state: None,
            error: Some(e.to_string()),
        }),
    }
}

/// GET /health
/// Health check endpoint
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "maze-api"
    }))
}

fn poisoned() -> HttpResponse {
    tracing::error!("Repository lock poisoned");
    HttpResponse::InternalServerError().json(serde_json::json!({
        "success": false,
        "error": "repository lock poisoned"
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Maze API Server");

    let config = HostConfig::from_env();
    let repository = MazeRepository::open(&config.store_dir)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let repository = web::Data::new(Mutex::new(repository));

    tracing::info!("Binding to {}", config.bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(repository.clone())
            .app_data(web::JsonConfig::default().limit(10_485_760)) // 10MB limit
            .route("/health", web::get().to(health))
            .route("/api/mazes", web::get().to(list_mazes))
            .route("/api/mazes", web::post().to(save_maze))
            .route("/api/mazes/{name}", web::get().to(get_maze))
            .route("/api/mazes/{name}", web::delete().to(delete_maze))
            .route("/api/generate", web::post().to(generate_maze))
            .route("/api/solve", web::post().to(solve_maze))
            .route("/api/route/step", web::post().to(route_step))
    })
    .bind(config.bind_address.as_str())?
    .run()
    .await
}
