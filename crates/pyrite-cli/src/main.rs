use std::{env, fs, process::ExitCode, time::Instant};

use pyrite::{EvalError, Interpreter};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let file_path = if args.len() > 1 { &args[1] } else { "example.py" };
    let code = match read_file(file_path) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let interp = Interpreter::new();
    let start = Instant::now();
    match interp.eval(&code) {
        Ok(value) => {
            let elapsed = start.elapsed();
            eprintln!("success after: {elapsed:?}\n{}", value.py_repr());
            ExitCode::SUCCESS
        }
        Err(err) => {
            let elapsed = start.elapsed();
            if let Some(code) = err.system_exit_code() {
                eprintln!("exited after: {elapsed:?} with code {code}");
                return ExitCode::from(u8::try_from(code.clamp(0, 255)).unwrap_or(1));
            }
            eprintln!("error after: {elapsed:?}\n{err}");
            if matches!(err, EvalError::Parse(_)) {
                return ExitCode::from(2);
            }
            ExitCode::FAILURE
        }
    }
}

fn read_file(file_path: &str) -> Result<String, String> {
    match fs::metadata(file_path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("{file_path} is not a file"));
            }
        }
        Err(err) => {
            return Err(format!("cannot read {file_path}: {err}"));
        }
    }
    fs::read_to_string(file_path).map_err(|err| format!("cannot read {file_path}: {err}"))
}
