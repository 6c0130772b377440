use std::path::{Path, PathBuf};
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, put, web};
use clap::Parser;
use log::{error, info};
use serde::{Deserialize, Serialize};

use ngram_gen_core::pipeline::DEFAULT_ORDER;
use ngram_gen_core::store::{SqliteStore, TransitionStore};
use ngram_gen_core::{Generator, NgramIndex, WeightedSampler};

#[derive(Parser)]
#[command(name = "ngram-gen-server")]
#[command(version, about = "Serve text generated from a stored n-gram model")]
struct Args {
	/// SQLite model file
	#[arg(long, default_value = "ngrams.db", env = "NGRAM_DB")]
	db: PathBuf,

	/// Number of runes per n-gram
	#[arg(short = 'n', long = "ngram", default_value_t = DEFAULT_ORDER, env = "NGRAM_ORDER")]
	order: usize,

	#[arg(long, default_value = "127.0.0.1", env = "NGRAM_HOST")]
	host: String,

	#[arg(short, long, default_value_t = 5000, env = "NGRAM_PORT")]
	port: u16,

	/// Largest `length` accepted by `/v1/generate`
	#[arg(long, default_value_t = 1_000_000, env = "NGRAM_MAX_LENGTH")]
	max_length: usize,
}

/// Query parameters of `/v1/generate`
#[derive(Deserialize)]
struct GenerateParams {
	length: Option<usize>,
}

#[derive(Serialize)]
struct Stats {
	order: usize,
	states: usize,
	transitions: usize,
	observations: u64,
}

struct SharedData {
	db: PathBuf,
	max_length: usize,
	index: NgramIndex,
}

impl GenerateParams {
	/// Requested length, defaulting to 1000 and bounded by `max_length`.
	fn length(&self, max_length: usize) -> Result<usize, String> {
		match self.length {
			None => Ok(1000_usize.min(max_length)),
			Some(length) if length > max_length => {
				Err(format!("length must be at most {max_length}, got {length}"))
			}
			Some(length) => Ok(length),
		}
	}
}

impl SharedData {
	fn load(db: &Path, order: usize) -> ngram_gen_core::Result<NgramIndex> {
		SqliteStore::open(db)?.load(order)
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Walks the loaded model for `length` runes (default 1000) and returns the
/// text as the response body. Lengths above `--max-length` are rejected.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let length = match query.length(shared_data.max_length) {
		Ok(length) => length,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};

	match Generator::new(&shared_data.index, WeightedSampler::from_entropy()).generate(length) {
		Ok(text) => HttpResponse::Ok().body(text),
		Err(ngram_gen_core::Error::EmptyModel) => HttpResponse::ServiceUnavailable().body("Model is empty"),
		Err(e) => {
			error!("generation failed: {e}");
			HttpResponse::InternalServerError().body(e.to_string())
		}
	}
}

#[get("/v1/stats")]
async fn get_stats(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let index = &shared_data.index;
	HttpResponse::Ok().json(Stats {
		order: index.order(),
		states: index.len(),
		transitions: index.transition_count(),
		observations: index.total_observations(),
	})
}

/// Reloads the model from storage, e.g. after a training run.
#[put("/v1/reload")]
async fn put_reload(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let order = shared_data.index.order();
	match SharedData::load(&shared_data.db, order) {
		Ok(index) => {
			info!("reloaded {} n-grams", index.len());
			shared_data.index = index;
			HttpResponse::Ok().body("Model reloaded")
		}
		Err(e) => HttpResponse::InternalServerError().body(format!("Failed to reload model: {e}")),
	}
}

/// Loads the model once, wraps it in a `Mutex` and serves it.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let args = Args::parse();
	let index = SharedData::load(&args.db, args.order)?;
	info!("loaded {} n-grams from {}", index.len(), args.db.display());

	let shared_model = web::Data::new(Mutex::new(SharedData { db: args.db, max_length: args.max_length, index }));

	info!("listening on {}:{}", args.host, args.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.service(get_generated)
			.service(get_stats)
			.service(put_reload)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await?;

	Ok(())
}
