use std::fs;
use std::path::PathBuf;

use regex::Regex;

use lpgn_sort::dedup::SmartDedup;
use lpgn_sort::error::SortError;
use lpgn_sort::order::Order;
use lpgn_sort::sort::{disk_sort, DiskSort};

mod common;

const MOVES: &str = "1.e4 e5 2.Nf3 Nc6 3.Bb5 a6 4.Ba4 Nf6";
const BRAZIL: &str = "Brazil Champs, Rio";

#[test]
fn test_exact_duplicates_collapse() -> Result<(), anyhow::Error> {
    common::setup();
    let input_path = common::temp_file_name("./target/results/");
    let output_path = common::temp_file_name("./target/results/");
    let a = "A@H[White \"a\"]@M1.d4 d5".to_string();
    let b = "B@H[White \"b\"]@M1.e4 e5".to_string();
    common::write_lines(input_path.clone(), &[b.clone(), a.clone(), a.clone()])?;

    let stats = disk_sort(&input_path, &output_path, None, false, true)?;
    assert_eq!(common::read_lines(output_path.clone())?, vec![a, b]);
    assert_eq!(stats.lines_read, 3);
    assert_eq!(stats.lines_written, 2);
    assert_eq!(stats.duplicates_dropped, 1);
    fs::remove_file(input_path)?;
    fs::remove_file(output_path)?;
    Ok(())
}

#[test]
fn test_sort_asc_and_desc() -> Result<(), anyhow::Error> {
    common::setup();
    let input_path = common::temp_file_name("./target/results/");
    let asc_output_path = common::temp_file_name("./target/results/");
    let desc_output_path = common::temp_file_name("./target/results/");
    let games = common::shuffled_games(1000, 11);
    common::write_lines(input_path.clone(), &games)?;

    let mut asc_sort = DiskSort::new(vec![input_path.clone()], asc_output_path.clone());
    asc_sort.with_chunk_size_bytes(10_000);
    let stats = asc_sort.sort()?;
    assert!(stats.chunks > 1);

    let mut desc_sort = DiskSort::new(vec![input_path.clone()], desc_output_path.clone());
    desc_sort.with_chunk_size_bytes(10_000);
    desc_sort.with_order(Order::Desc);
    desc_sort.sort()?;

    let mut expected = games.clone();
    expected.sort();
    let asc_lines = common::read_lines(asc_output_path.clone())?;
    assert_eq!(asc_lines, expected);
    expected.reverse();
    let desc_lines = common::read_lines(desc_output_path.clone())?;
    assert_eq!(desc_lines, expected);

    let mut check = DiskSort::new(vec![asc_output_path.clone()], PathBuf::new());
    assert!(check.check()?);
    check.with_order(Order::Desc);
    assert!(!check.check()?);

    fs::remove_file(input_path)?;
    fs::remove_file(asc_output_path)?;
    fs::remove_file(desc_output_path)?;
    Ok(())
}

#[test]
fn test_every_run_of_duplicates_keeps_one() -> Result<(), anyhow::Error> {
    common::setup();
    let input_path = common::temp_file_name("./target/results/");
    let output_path = common::temp_file_name("./target/results/");
    let games = common::shuffled_games(300, 5);
    let mut input = games.clone();
    for (i, game) in games.iter().enumerate() {
        for _ in 0..i % 4 {
            input.push(game.clone());
        }
    }
    common::write_lines(input_path.clone(), &input)?;

    let mut games_sort = DiskSort::new(vec![input_path.clone()], output_path.clone());
    games_sort.with_chunk_size_bytes(4_000);
    let stats = games_sort.sort()?;

    let lines = common::read_lines(output_path.clone())?;
    let mut expected = games.clone();
    expected.sort();
    assert_eq!(lines, expected);
    assert_eq!(stats.duplicates_dropped, input.len() - games.len());
    assert!(lines.windows(2).all(|pair| pair[0] != pair[1]));
    fs::remove_file(input_path)?;
    fs::remove_file(output_path)?;
    Ok(())
}

#[test]
fn test_chunk_size_does_not_change_output() -> Result<(), anyhow::Error> {
    common::setup();
    let input_path = common::temp_file_name("./target/results/");
    let mut games = common::shuffled_games(200, 23);
    games.extend(common::shuffled_games(50, 23));
    common::write_lines(input_path.clone(), &games)?;

    let mut outputs = Vec::new();
    for chunk_size_bytes in [1, 700, 10_000_000] {
        let output_path = common::temp_file_name("./target/results/");
        let mut games_sort = DiskSort::new(vec![input_path.clone()], output_path.clone());
        games_sort.with_chunk_size_bytes(chunk_size_bytes);
        games_sort.sort()?;
        outputs.push(fs::read(&output_path)?);
        fs::remove_file(output_path)?;
    }
    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[1], outputs[2]);
    fs::remove_file(input_path)?;
    Ok(())
}

fn smart_dedup(smart_dedup: SmartDedup) -> Result<(), anyhow::Error> {
    common::setup();
    let input_path = common::temp_file_name("./target/results/");
    let output_path = common::temp_file_name("./target/results/");
    let diagnostics_path = common::temp_file_name("./target/results/");
    let plain = common::game("2016-11-03", BRAZIL, "01", 1, "Silva", "Souza", MOVES);
    let annotated = common::game(
        "2016-11-03", BRAZIL, "01", 2, "Silva", "Souza",
        "1.e4 e5 2.Nf3 Nc6 3.Bb5 {Ruy Lopez} a6 4.Ba4 Nf6",
    );
    let copy = common::game("2016-11-03", BRAZIL, "01", 3, "Silva", "Souza", MOVES);
    let other = common::game("2016-11-03", BRAZIL, "01", 4, "Costa", "Lima", "1.d4 d5 2.c4 e6 3.Nc3 Nf6");
    common::write_lines(input_path.clone(), &[copy, other.clone(), annotated.clone(), plain])?;

    let mut games_sort = DiskSort::new(vec![input_path.clone()], output_path.clone());
    games_sort.with_diagnostics(diagnostics_path.clone());
    games_sort.with_smart_dedup(smart_dedup);
    let stats = games_sort.sort()?;

    assert_eq!(common::read_lines(output_path.clone())?, vec![annotated, other]);
    assert_eq!(stats.duplicates_dropped, 2);
    assert_eq!(stats.smart_runs, 1);

    let diagnostics = common::read_lines(diagnostics_path.clone())?;
    assert_eq!(diagnostics.len(), 3);
    assert_eq!(diagnostics.iter().filter(|line| line.contains("[White \"KEEP Silva\"]")).count(), 1);
    assert_eq!(diagnostics.iter().filter(|line| line.contains("[White \"DISCARD Silva\"]")).count(), 2);
    assert!(diagnostics[0].contains("{Ruy Lopez}"));

    fs::remove_file(input_path)?;
    fs::remove_file(output_path)?;
    fs::remove_file(diagnostics_path)?;
    Ok(())
}

#[test]
fn test_smart_dedup_lookback() -> Result<(), anyhow::Error> {
    smart_dedup(SmartDedup::Lookback)
}

#[test]
fn test_smart_dedup_day_bucket() -> Result<(), anyhow::Error> {
    smart_dedup(SmartDedup::DayBucket)
}

#[test]
fn test_no_smart_dedup_without_diagnostics() -> Result<(), anyhow::Error> {
    common::setup();
    let input_path = common::temp_file_name("./target/results/");
    let output_path = common::temp_file_name("./target/results/");
    let plain = common::game("2016-11-03", BRAZIL, "01", 1, "Silva", "Souza", MOVES);
    let copy = common::game("2016-11-03", BRAZIL, "01", 2, "Silva", "Souza", MOVES);
    common::write_lines(input_path.clone(), &[copy.clone(), plain.clone()])?;

    let stats = disk_sort(&input_path, &output_path, None, false, true)?;
    assert_eq!(common::read_lines(output_path.clone())?, vec![plain, copy]);
    assert_eq!(stats.duplicates_dropped, 0);
    fs::remove_file(input_path)?;
    fs::remove_file(output_path)?;
    Ok(())
}

#[test]
fn test_multiple_inputs_and_ignored_lines() -> Result<(), anyhow::Error> {
    common::setup();
    let first_path = common::temp_file_name("./target/results/");
    let second_path = common::temp_file_name("./target/results/");
    let output_path = common::temp_file_name("./target/results/");
    fs::write(&first_path, "c@H\n% generated\n\na@H\n")?;
    fs::write(&second_path, "b@H\r\n% generated\r\na@H")?;

    let mut games_sort = DiskSort::new(vec![first_path.clone(), second_path.clone()], output_path.clone());
    games_sort.with_ignore_empty();
    games_sort.with_ignore_lines(Regex::new("^%")?);
    let stats = games_sort.sort()?;

    assert_eq!(fs::read_to_string(&output_path)?, "a@H\nb@H\nc@H\n");
    assert_eq!(stats.lines_read, 4);
    fs::remove_file(first_path)?;
    fs::remove_file(second_path)?;
    fs::remove_file(output_path)?;
    Ok(())
}

#[test]
fn test_temp_files_are_removed() -> Result<(), anyhow::Error> {
    common::setup();
    let dir = common::temp_file_name("./target/results/");
    fs::create_dir_all(&dir)?;
    let input_path = dir.join("games.lpgn");
    let output_path = dir.join("sorted.lpgn");
    common::write_lines(input_path.clone(), &common::shuffled_games(100, 3))?;

    let mut games_sort = DiskSort::new(vec![input_path.clone()], output_path.clone());
    games_sort.with_chunk_size_bytes(1_000);
    games_sort.sort()?;

    let mut names: Vec<String> = fs::read_dir(&dir)?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().to_string()))
        .collect::<Result<_, _>>()?;
    names.sort();
    assert_eq!(names, vec!["games.lpgn", "sorted.lpgn"]);
    fs::remove_dir_all(dir)?;
    Ok(())
}

#[test]
fn test_missing_input() -> Result<(), anyhow::Error> {
    common::setup();
    let input_path = common::temp_file_name("./target/results/");
    let output_path = common::temp_file_name("./target/results/");
    let error = disk_sort(&input_path, &output_path, None, false, true).err().unwrap();
    match error.downcast_ref::<SortError>() {
        Some(SortError::Open { path, .. }) => assert_eq!(path, &input_path),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!output_path.exists());
    Ok(())
}
