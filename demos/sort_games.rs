use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Error};
use simple_logger::SimpleLogger;

use lpgn_sort::dedup::SmartDedup;
use lpgn_sort::pipeline::Pipeline;
use lpgn_sort::refine::refine_sort;
use lpgn_sort::sort::{disk_sort, DiskSort};

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

const GAMES: [&str; 6] = [
    "2017-01-02 Brazil Champs, Rio # 2017-01-02 01 000000006 Lima-Horvat@H[White \"Lima, D\"]@H[Black \"Horvat, E\"]@M1.d4 Nf6 2.c4 e6 3.Nc3 Bb4",
    "2016-12-05 Other Open, Lima # 2016-12-05 01 000000004 Hansen-Berg@H[White \"Hansen, F\"]@H[Black \"Berg, G\"]@M1.c4 e5 2.Nc3 Nf6 3.Nf3 Nc6",
    "2016-11-03 Brazil Champs, Rio # 2016-11-03 02 000000002 Costa-Silva@H[White \"Costa, C\"]@H[Black \"Silva, A\"]@M1.e4 c5 2.Nf3 d6 3.d4 cxd4",
    "2016-11-01 Brazil Champs, Rio # 2016-11-01 01 000000001 Silva-Souza@H[White \"Silva, A\"]@H[Black \"Souza, B\"]@M1.e4 e5 2.Nf3 Nc6 3.Bb5 a6",
    "2016-11-01 Brazil Champs, Rio # 2016-11-01 01 000000003 Silva-Souza@H[White \"Silva, A\"]@H[Black \"Souza, B\"]@H[Annotator \"X\"]@M1.e4 e5 2.Nf3 Nc6 3.Bb5 {Ruy Lopez} a6",
    "2016-12-06 Other Open, Lima # 2016-12-06 02 000000005 Berg-Novak@H[White \"Berg, G\"]@H[Black \"Novak, H\"]@M1.e4 e5 2.Nf3 Nc6 3.Bc4 Bc5",
];

fn write_games(path: &Path) -> Result<(), Error> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    for game in GAMES {
        writeln!(writer, "{}", game)?;
    }
    writer.flush()?;
    Ok(())
}

fn sort_and_refine(input_path: &Path, sorted_path: &Path, refined_path: &Path) -> Result<(), Error> {
    // ascending, byte identical duplicates dropped, no smart dedup
    disk_sort(input_path, sorted_path, None, false, true)?;
    refine_sort(sorted_path, refined_path)?;
    Ok(())
}

fn sort_with_smart_dedup(input_path: &Path, output_path: &Path, diagnostics_path: &Path) -> Result<(), Error> {
    let mut disk_sort = DiskSort::new(vec![input_path.to_path_buf()], output_path.to_path_buf());
    disk_sort.with_chunk_size_bytes(256);
    disk_sort.with_smart_dedup(SmartDedup::DayBucket);
    disk_sort.with_diagnostics(diagnostics_path.to_path_buf());
    disk_sort.sort()?;
    Ok(())
}

fn most_recent_first(input_path: &Path, output_path: &Path, diagnostics_path: &Path) -> Result<(), Error> {
    let mut pipeline = Pipeline::new(input_path.to_path_buf(), output_path.to_path_buf());
    pipeline.with_diagnostics(diagnostics_path.to_path_buf());
    pipeline.with_most_recent_first(true);
    pipeline.run()?;
    Ok(())
}

// cargo run -r --example sort_games
pub fn main() -> Result<(), Error> {
    SimpleLogger::new().init().map_err(|e| anyhow!("{}", e))?;

    let input_path = PathBuf::from("./target/games.lpgn");
    let sorted_path = PathBuf::from("./target/games-sorted.lpgn");
    let refined_path = PathBuf::from("./target/games-refined.lpgn");
    let deduped_path = PathBuf::from("./target/games-deduped.lpgn");
    let database_path = PathBuf::from("./target/games-database.lpgn");
    let diagnostics_path = PathBuf::from("./target/games-duplicates.lpgn");

    write_games(&input_path)?;
    sort_and_refine(&input_path, &sorted_path, &refined_path)?;
    sort_with_smart_dedup(&input_path, &deduped_path, &diagnostics_path)?;
    most_recent_first(&input_path, &database_path, &diagnostics_path)?;

    Ok(())
}
