use std::io::{self, Write};

/// A closed pipe (`duesly member list | head`) is not an error.
pub fn write_stdout_text(text: &str) -> io::Result<()> {
    write_tolerating_closed_pipe(&mut io::stdout().lock(), text, false)
}

pub fn write_stdout_line(text: &str) -> io::Result<()> {
    write_tolerating_closed_pipe(&mut io::stdout().lock(), text, true)
}

fn write_tolerating_closed_pipe(writer: &mut dyn Write, text: &str, newline: bool) -> io::Result<()> {
    let written = writer
        .write_all(text.as_bytes())
        .and_then(|()| if newline { writer.write_all(b"\n") } else { Ok(()) })
        .and_then(|()| writer.flush());
    match written {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use super::write_tolerating_closed_pipe;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn line_gets_trailing_newline() {
        let mut buffer = Vec::new();
        let result = write_tolerating_closed_pipe(&mut buffer, "4 member(s):", true);
        assert!(result.is_ok());
        assert_eq!(buffer, b"4 member(s):\n");
    }

    #[test]
    fn closed_pipe_is_swallowed_other_errors_are_not() {
        assert!(write_tolerating_closed_pipe(&mut ClosedPipe, "dash", true).is_ok());
        assert!(write_tolerating_closed_pipe(&mut FullDisk, "dash", true).is_err());
    }
}
