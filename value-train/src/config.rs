use clap::{Arg, ArgAction, Command, crate_authors, crate_description, crate_name, crate_version, value_parser};
use std::path::PathBuf;
use strum::{EnumString, VariantNames};

#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumString, VariantNames)]
#[strum(ascii_case_insensitive)]
pub enum Backend {
  Ndarray,
  Wgpu,
}

/// Who makes the moves while gathering.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumString, VariantNames)]
#[strum(ascii_case_insensitive)]
pub enum Player {
  Human,
  Greedy,
  Random,
}

pub enum Action {
  Gather {
    model: Option<PathBuf>,
    player: Player,
    output: Option<PathBuf>,
  },
  Train {
    model: Option<PathBuf>,
    model_new: PathBuf,
    games: Vec<PathBuf>,
    batch_size: usize,
    epochs: usize,
    shuffle_window: usize,
    shuffle: bool,
    augment: bool,
  },
  Evaluate {
    model: PathBuf,
    games: Vec<PathBuf>,
    batch_size: usize,
  },
}

pub struct Config {
  pub backend: Backend,
  pub seed: Option<u64>,
  pub params: Option<PathBuf>,
}

fn model_arg(required: bool) -> Arg {
  Arg::new("model")
    .long("model")
    .short('m')
    .help("Model path")
    .num_args(1)
    .value_parser(value_parser!(PathBuf))
    .required(required)
}

fn games_arg() -> Arg {
  Arg::new("games")
    .long("games")
    .short('g')
    .help("Paths of the recorded games")
    .num_args(1..)
    .value_parser(value_parser!(PathBuf))
    .required(true)
}

fn batch_size_arg() -> Arg {
  Arg::new("batch-size")
    .long("batch-size")
    .help("Number of records in a batch")
    .num_args(1)
    .value_parser(value_parser!(u64).range(1..))
    .default_value("32")
}

pub fn cli_parse() -> (Config, Action) {
  let gather = Command::new("gather")
    .about("Play a single game and record it")
    .arg(model_arg(false))
    .arg(
      Arg::new("player")
        .long("player")
        .short('p')
        .help("Who makes the moves")
        .num_args(1)
        .value_parser(value_parser!(Player))
        .ignore_case(true)
        .default_value("Human"),
    )
    .arg(
      Arg::new("output")
        .long("output")
        .short('o')
        .help("Path where to save the recorded game")
        .num_args(1)
        .value_parser(value_parser!(PathBuf)),
    );
  let train = Command::new("train")
    .about("Train the neural network")
    .arg(model_arg(false))
    .arg(
      Arg::new("model-new")
        .long("model-new")
        .short('n')
        .help("Trained model path")
        .num_args(1)
        .value_parser(value_parser!(PathBuf))
        .required(true),
    )
    .arg(games_arg())
    .arg(batch_size_arg())
    .arg(
      Arg::new("epochs")
        .long("epochs")
        .help("Number of passes over the records")
        .num_args(1)
        .value_parser(value_parser!(u64).range(1..))
        .default_value("1"),
    )
    .arg(
      Arg::new("shuffle-window")
        .long("shuffle-window")
        .help("Number of records buffered for shuffling")
        .num_args(1)
        .value_parser(value_parser!(u64))
        .default_value("256"),
    )
    .arg(
      Arg::new("no-shuffle")
        .long("no-shuffle")
        .help("Keep the records order")
        .action(ArgAction::SetFalse),
    )
    .arg(
      Arg::new("no-augment")
        .long("no-augment")
        .help("Don't add rotated and flipped copies of the records")
        .action(ArgAction::SetFalse),
    );
  let evaluate = Command::new("evaluate")
    .about("Compute the loss of the neural network on recorded games")
    .arg(model_arg(true))
    .arg(games_arg())
    .arg(batch_size_arg());

  let matches = Command::new(crate_name!())
    .version(crate_version!())
    .author(crate_authors!("\n"))
    .about(crate_description!())
    .subcommand(gather)
    .subcommand(train)
    .subcommand(evaluate)
    .subcommand_required(true)
    .arg(
      Arg::new("backend")
        .long("backend")
        .help("Backend to run the neural network")
        .num_args(1)
        .value_parser(value_parser!(Backend))
        .ignore_case(true)
        .default_value("Ndarray"),
    )
    .arg(
      Arg::new("seed")
        .long("seed")
        .help("Seed for the random number generator")
        .num_args(1)
        .value_parser(value_parser!(u64)),
    )
    .arg(
      Arg::new("params")
        .long("params")
        .help("JSON file with the network hyperparameters")
        .num_args(1)
        .value_parser(value_parser!(PathBuf)),
    )
    .get_matches();

  let backend = matches.get_one("backend").copied().unwrap();
  let seed = matches.get_one("seed").copied();
  let params = matches.get_one("params").cloned();

  let config = Config { backend, seed, params };

  let action = match matches.subcommand() {
    Some(("gather", matches)) => {
      let model = matches.get_one("model").cloned();
      let player = matches.get_one("player").copied().unwrap();
      let output = matches.get_one("output").cloned();
      Action::Gather { model, player, output }
    }
    Some(("train", matches)) => {
      let model = matches.get_one("model").cloned();
      let model_new = matches.get_one("model-new").cloned().unwrap();
      let games = matches.get_many("games").unwrap().cloned().collect();
      let batch_size = matches.get_one::<u64>("batch-size").copied().unwrap() as usize;
      let epochs = matches.get_one::<u64>("epochs").copied().unwrap() as usize;
      let shuffle_window = matches.get_one::<u64>("shuffle-window").copied().unwrap() as usize;
      let shuffle = matches.get_flag("no-shuffle");
      let augment = matches.get_flag("no-augment");
      Action::Train {
        model,
        model_new,
        games,
        batch_size,
        epochs,
        shuffle_window,
        shuffle,
        augment,
      }
    }
    Some(("evaluate", matches)) => {
      let model = matches.get_one("model").cloned().unwrap();
      let games = matches.get_many("games").unwrap().cloned().collect();
      let batch_size = matches.get_one::<u64>("batch-size").copied().unwrap() as usize;
      Action::Evaluate {
        model,
        games,
        batch_size,
      }
    }
    _ => panic!("no subcommand"),
  };

  (config, action)
}
