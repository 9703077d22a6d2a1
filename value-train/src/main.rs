mod config;
mod terminal;

use anyhow::{Result, anyhow};
use burn::{
  backend::{Autodiff, NdArray, Wgpu, ndarray::NdArrayDevice, wgpu::WgpuDevice},
  optim::AdamConfig,
  tensor::backend::{AutodiffBackend, Backend},
};
use config::{Action, Backend as ConfigBackend, Config, Player, cli_parse};
use either::Either;
use num_traits::Float;
use q2048_game::{game::Game, record::Record};
use q2048_rotate::rotate::SYMMETRIES;
use q2048_value::{
  augment::augmented,
  batches::{BatchConfig, batches},
  model::TrainableModel,
  policy::{GreedyDriver, ModelPolicy, NoPolicy, RandomDriver},
  random_model::RandomModel,
  records,
  session::play,
};
use q2048_value_burn::model::{Learner, Predictor, ValueNetwork, ValueNetworkConfig};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use std::{
  fs, io,
  path::{Path, PathBuf},
  process::ExitCode,
  time::{SystemTime, UNIX_EPOCH},
};
use terminal::TerminalDriver;

fn network_config(params: Option<&Path>) -> Result<ValueNetworkConfig> {
  match params {
    Some(path) => {
      log::info!("Loading hyperparameters from {}", path.display());
      Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
    None => Ok(ValueNetworkConfig::default()),
  }
}

fn load_records(paths: &[PathBuf]) -> Result<Vec<Record>> {
  let mut result = Vec::new();
  for path in paths {
    let loaded = records::load(path)?;
    log::info!("Loaded {} records from {}", loaded.len(), path.display());
    result.extend(loaded);
  }
  Ok(result)
}

fn gather<B: Backend, R: Rng>(
  config: &Config,
  model_path: Option<PathBuf>,
  player: Player,
  output: Option<PathBuf>,
  device: B::Device,
  rng: &mut R,
) -> Result<ExitCode>
where
  B::FloatElem: Float,
{
  let mut policy = match model_path {
    Some(path) => {
      let network = network_config(config.params.as_deref())?;
      log::info!("Loading the model from {}", path.display());
      let predictor = Predictor::<B>::load(&network, path, device)?;
      Either::Right(Either::Right(ModelPolicy::<_, B::FloatElem>::new(predictor)))
    }
    None if player == Player::Human => Either::Left(NoPolicy),
    None => Either::Right(Either::Left(ModelPolicy::<_, B::FloatElem>::new(RandomModel(
      SmallRng::from_rng(rng),
    )))),
  };

  let mut driver = match player {
    Player::Human => Either::Left(TerminalDriver::new(io::stdin().lock(), io::stdout())),
    Player::Greedy => Either::Right(Either::Left(GreedyDriver)),
    Player::Random => Either::Right(Either::Right(RandomDriver(SmallRng::from_rng(rng)))),
  };

  let mut game = Game::new();
  let seed = config.seed.map(|_| rng.random());
  let trace = play(&mut game, &mut policy, &mut driver, seed).map_err(|e| anyhow!("game failed: {:?}", e))?;

  log::info!(
    "{:?} with score {} and {} records",
    trace.outcome,
    game.score(),
    trace.records.len()
  );

  let output = match output {
    Some(path) => path,
    None => PathBuf::from(format!(
      "data_{}.csv",
      SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs()
    )),
  };
  records::save(&output, &trace.records)?;
  log::info!("Saved the game to {}", output.display());

  Ok(ExitCode::SUCCESS)
}

#[allow(clippy::too_many_arguments)]
fn train<B: AutodiffBackend, R: Rng>(
  config: &Config,
  model_path: Option<PathBuf>,
  model_new_path: PathBuf,
  games_paths: Vec<PathBuf>,
  batch_config: BatchConfig,
  augment: bool,
  device: B::Device,
  rng: &mut R,
) -> Result<ExitCode>
where
  B::FloatElem: Float,
{
  let network = network_config(config.params.as_deref())?;
  let predictor = match model_path {
    Some(path) => {
      log::info!("Loading the model from {}", path.display());
      Predictor::<B>::load(&network, path, device)?
    }
    None => Predictor::<B>::new(&network, device),
  };
  let optimizer = AdamConfig::new().init::<B, ValueNetwork<B>>();
  let mut learner = Learner {
    predictor,
    optimizer,
    learning_rate: network.learning_rate,
  };

  let records = load_records(&games_paths)?;
  let symmetries = SYMMETRIES;
  let symmetries = if augment { &symmetries[..] } else { &symmetries[..1] };
  log::info!(
    "Training on {} records with {} symmetries",
    records.len(),
    symmetries.len()
  );

  let mut batches = batches(
    augmented(records.iter().copied(), symmetries),
    batch_config,
    SmallRng::from_rng(rng),
  );
  let mut epoch = 0;
  let mut loss_sum = 0.0;
  let mut count = 0;
  while let Some(batch) = batches.next() {
    if batches.repetition() != epoch {
      if count > 0 {
        log::info!("Epoch {} loss: {}", epoch, loss_sum / count as f64);
      }
      epoch = batches.repetition();
      loss_sum = 0.0;
      count = 0;
    }
    let (trained, loss) = learner.train(batch.boards(), batch.actions(), batch.rewards())?;
    learner = trained;
    loss_sum += num_traits::cast::<_, f64>(loss).unwrap_or(f64::NAN) * batch.len() as f64;
    count += batch.len();
  }
  if count > 0 {
    log::info!("Epoch {} loss: {}", epoch, loss_sum / count as f64);
  }

  learner.predictor.save(&model_new_path)?;
  log::info!("Saved the model to {}", model_new_path.display());

  Ok(ExitCode::SUCCESS)
}

fn evaluate<B: Backend>(
  config: &Config,
  model_path: PathBuf,
  games_paths: Vec<PathBuf>,
  batch_size: usize,
  device: B::Device,
) -> Result<ExitCode>
where
  B::FloatElem: Float,
{
  let network = network_config(config.params.as_deref())?;
  let predictor = Predictor::<B>::load(&network, model_path, device)?;
  let records = load_records(&games_paths)?;
  if records.is_empty() {
    log::warn!("No records to evaluate on");
    return Ok(ExitCode::FAILURE);
  }

  let batch_config = BatchConfig {
    shuffle: false,
    repeat_count: 1,
    batch_size,
    ..Default::default()
  };
  let mut loss_sum = 0.0;
  for batch in batches(records.iter().copied(), batch_config, SmallRng::seed_from_u64(0)) {
    let loss = predictor.loss(batch.boards(), batch.actions(), batch.rewards())?;
    loss_sum += num_traits::cast::<_, f64>(loss).unwrap_or(f64::NAN) * batch.len() as f64;
  }

  log::info!("Loss on {} records: {}", records.len(), loss_sum / records.len() as f64);

  Ok(ExitCode::SUCCESS)
}

fn run<B: AutodiffBackend>(config: Config, action: Action, device: B::Device) -> Result<ExitCode>
where
  B::FloatElem: Float,
{
  let mut rng = config.seed.map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);

  match action {
    Action::Gather { model, player, output } => {
      gather::<B::InnerBackend, _>(&config, model, player, output, device, &mut rng)
    }
    Action::Train {
      model,
      model_new,
      games,
      batch_size,
      epochs,
      shuffle_window,
      shuffle,
      augment,
    } => {
      let batch_config = BatchConfig {
        shuffle,
        shuffle_window,
        repeat_count: epochs,
        batch_size,
      };
      train::<B, _>(&config, model, model_new, games, batch_config, augment, device, &mut rng)
    }
    Action::Evaluate {
      model,
      games,
      batch_size,
    } => evaluate::<B::InnerBackend>(&config, model, games, batch_size, device),
  }
}

fn main() -> Result<ExitCode> {
  let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
  env_logger::Builder::from_env(env).init();

  let (config, action) = cli_parse();

  match config.backend {
    ConfigBackend::Ndarray => run::<Autodiff<NdArray>>(config, action, NdArrayDevice::Cpu),
    ConfigBackend::Wgpu => run::<Autodiff<Wgpu>>(config, action, WgpuDevice::DefaultDevice),
  }
}
