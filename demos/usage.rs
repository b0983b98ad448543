use replay_bf::{Config, Interpreter};

fn main() {
    // Nested loops: the inner countdown restarts on every outer iteration.
    let code = "
        ++          outer counter
        [
            >+++    inner counter
            [-.]    count down and print
            <-
        ]
        >>
    ";

    let mut bf = match Interpreter::new(&Config::default(), std::io::stdin(), std::io::stdout()) {
        Ok(bf) => bf,
        Err(err) => {
            eprintln!("bad configuration: {err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = bf.run_str(code) {
        eprintln!("interpreter error: {err}");
        std::process::exit(1);
    }

    eprintln!("instructions: {}", String::from_utf8_lossy(bf.accumulator().instructions()));
    eprintln!("tape: {:?}", &bf.tape().cells()[..4]);
}
