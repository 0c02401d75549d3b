use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn pastar(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pastar"))
        .args(args)
        .output()
        .expect("Failed to execute pastar")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "Command failed with status: {:?}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_grid_default_scenario() {
    for algorithm in ["sequential", "symmetric", "served", "pulled"] {
        let output = pastar(&["grid", "--algorithm", algorithm, "-j", "2"]);
        let stdout = stdout_of(&output);

        assert!(stdout.contains("Path (5 states):"), "{}:\n{}", algorithm, stdout);
        assert!(stdout.contains("Solution cost: 4"));
        assert!(stdout.contains(&format!("Algorithm: {}", algorithm)));
    }
}

#[test]
fn test_grid_moves() {
    let output = pastar(&["grid", "--size", "4x2", "--goal", "3,1", "--moves"]);
    let stdout = stdout_of(&output);

    let moves = stdout
        .lines()
        .find(|line| line.starts_with("Moves (4):"))
        .expect("moves line");
    assert_eq!(moves.matches("right").count(), 3);
    assert_eq!(moves.matches("down").count(), 1);
}

#[test]
fn test_grid_walls_block_goal() {
    let output = pastar(&[
        "grid", "--size", "3x3", "--wall", "1,2", "--wall", "2,1", "--storage", "layered",
    ]);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("No solution found"));
    assert!(stdout.contains("Solution: none"));
}

#[test]
fn test_grid_map_file() {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR"));
    let map = dir.join("pastar_cli_map.txt");
    fs::write(&map, "S.#\n..#\n#.G\n").unwrap();

    let output = pastar(&["grid", "--map", map.to_str().unwrap(), "--algorithm", "served"]);
    let stdout = stdout_of(&output);
    let _ = fs::remove_file(&map);

    assert!(stdout.contains("Path (5 states):"), "{}", stdout);
    assert!(stdout.contains("S.#\n**#\n#*G\n") || stdout.contains("S*#\n.*#\n#*G\n"));
}

#[test]
fn test_grid_rejects_start_on_wall() {
    let output = pastar(&["grid", "--wall", "0,0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Start 0,0"), "{}", stderr);
}

#[test]
fn test_slide_solves_board() {
    let output = pastar(&["slide", "1", "2", "3", "4", "5", "6", "0", "7", "8", "--moves"]);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Moves (2): right right"), "{}", stdout);
}

#[test]
fn test_slide_pulled_with_progress() {
    let output = pastar(&[
        "slide",
        "4 1 3 7 2 6 0 5 8",
        "--algorithm",
        "pulled",
        "-j",
        "3",
        "--progress",
    ]);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Solution (6 moves):"), "{}", stdout);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("progress: estimate"));
}

#[test]
fn test_slide_unsolvable_board() {
    let output = pastar(&["slide", "2 1 3 4 5 6 7 8 0"]);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("board is not solvable"));
}

#[test]
fn test_slide_rejects_malformed_board() {
    let output = pastar(&["slide", "1 2 3"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid board"), "{}", stderr);
}
