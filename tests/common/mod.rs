use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::fs::File;
use data_encoding::HEXLOWER;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub fn setup() {
    let results_dir_path = PathBuf::from_str("./target/results/").unwrap();

    if !results_dir_path.exists() {
        fs::create_dir_all(&results_dir_path).unwrap_or_else(|_|
            panic!("Failed to create results directory: {:?}", results_dir_path)
        );
    } else {
        println!("Results directory exists at {:?}", results_dir_path);
    }
}

#[allow(dead_code)]
pub fn read_lines(path: PathBuf) -> Result<Vec<String>, anyhow::Error> {
    let reader = BufReader::new(File::open(path)?);
    let lines = reader.lines().map(|x| x.unwrap()).collect();
    Ok(lines)
}

#[allow(dead_code)]
pub fn write_lines(path: PathBuf, lines: &[String]) -> Result<(), anyhow::Error> {
    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

#[allow(dead_code)]
pub fn temp_file_name(dir: &str) -> PathBuf {
    let mut result = PathBuf::from(dir);
    let name = HEXLOWER.encode(&rand::random::<[u8; 16]>());
    result.push(name);
    result
}

#[allow(dead_code)]
pub fn game(date: &str, tournament: &str, round: &str, tie_breaker: u32, white: &str, black: &str, moves: &str) -> String {
    format!(
        "{date} {tournament} # {date} {round} {tie_breaker:09} {white}-{black}@H[Event \"{tournament}\"]@H[White \"{white}\"]@H[Black \"{black}\"]@M{moves}"
    )
}

#[allow(dead_code)]
const PLAYERS: [&str; 8] = ["Silva", "Souza", "Costa", "Lima", "Hansen", "Berg", "Novak", "Horvat"];
#[allow(dead_code)]
const OPENINGS: [&str; 4] = [
    "1.e4 e5 2.Nf3 Nc6 3.Bb5 a6 4.Ba4 Nf6",
    "1.d4 d5 2.c4 e6 3.Nc3 Nf6 4.Bg5 Be7",
    "1.e4 c5 2.Nf3 d6 3.d4 cxd4 4.Nxd4 Nf6",
    "1.c4 e5 2.Nc3 Nf6 3.Nf3 Nc6 4.g3 d5",
];

/// `count` distinct games with unique tie-breakers, in a seeded random order
#[allow(dead_code)]
pub fn shuffled_games(count: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut games: Vec<String> = (0..count)
        .map(|i| {
            let day = rng.gen_range(1..=28);
            let month = rng.gen_range(1..=12);
            let white = PLAYERS[rng.gen_range(0..PLAYERS.len())];
            let black = PLAYERS[rng.gen_range(0..PLAYERS.len())];
            let moves = OPENINGS[rng.gen_range(0..OPENINGS.len())];
            game(
                &format!("2016-{month:02}-{day:02}"),
                &format!("Open {}, Rio", i % 7),
                &format!("{:02}", i % 9 + 1),
                i as u32,
                white,
                black,
                moves,
            )
        })
        .collect();
    games.shuffle(&mut rng);
    games
}
