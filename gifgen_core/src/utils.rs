use colour::red;

pub fn print_intro() {
    println!(
        r#"
        _  __
   __ _(_)/ _| __ _  ___ _ __
  / _` | | |_ / _` |/ _ \ '_ \
 | (_| | |  _| (_| |  __/ | | |
  \__, |_|_|  \__, |\___|_| |_|
  |___/       |___/            "#
    );

    if cfg!(debug_assertions) {
        red!("\nWARNING: YOU ARE RUNNING IN DEBUG MODE. Quantization and compression are way slower than they should be.\n\n");
    }
}
