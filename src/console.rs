use std::io::{self, Write};

/// Progress output that remembers whether the last thing written left a line
/// open, so a message can start on a fresh line without a stray blank one.
pub struct Console<W> {
    inner: W,
    line_open: bool,
}

impl<W: Write> Console<W> {
    pub fn new(inner: W) -> Console<W> {
        Console {
            inner: inner,
            line_open: false,
        }
    }

    pub fn start_line(&mut self) -> io::Result<()> {
        if self.line_open {
            self.write_all(b"\n")?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for Console<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        if let Some(&last) = buf[..written].last() {
            self.line_open = last != b'\n';
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_line_only_breaks_an_open_line() {
        let mut console = Console::new(Vec::new());

        console.start_line().unwrap();
        write!(console, "Waiting").unwrap();
        console.start_line().unwrap();
        console.start_line().unwrap();
        writeln!(console, "Retrying").unwrap();
        console.start_line().unwrap();

        assert_eq!(String::from_utf8(console.into_inner()).unwrap(), "Waiting\nRetrying\n");
    }
}
