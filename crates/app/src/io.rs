use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

const STDIO: &str = "-";

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO
}

/// Read all of `path`, or stdin for `-`
pub fn read_input(path: &Path) -> io::Result<Vec<u8>> {
    if is_stdio(path) {
        let mut buffer = Vec::new();
        io::stdin().lock().read_to_end(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read(path)
    }
}

/// Write `contents` to `path`, or stdout for `-`
pub fn write_output(path: &Path, contents: &[u8]) -> io::Result<()> {
    if is_stdio(path) {
        let mut stdout = io::stdout().lock();
        stdout.write_all(contents)?;
        stdout.flush()
    } else {
        fs::write(path, contents)
    }
}
