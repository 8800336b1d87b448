//! A line based TCP front end to the solver.
//!
//! Every request is one line holding a cube definition and is answered with
//! one line holding the solution or the error. A browser pointed at
//! `http://host:port/<cube>` is answered with a small HTML page instead.

use std::{
    io::{self, BufRead, BufReader, Write},
    net::{TcpListener, TcpStream},
    thread,
};

use log::{debug, info, warn};
use twophase::{TwoPhaseSolver, start, success};

/// The characters a request is reduced to before it is looked at.
const REQUEST_CHARS: &str = "GETURFDLB";

/// Longest request accepted before the connection is dropped.
const MAX_REQUEST_LEN: usize = 1024;

const PAGE_HEAD: &str =
    "HTTP/1.1 200 OK\n\n<html><head><title>Answer from Cubesolver</title></head><body>\n";
const PAGE_TAIL: &str = "\n</body></html>\n";

#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    /// Answer and keep reading requests.
    Line(String),
    /// Answer with a web page and close the connection.
    Page(String),
    Close,
}

/// Works out the reply to one request line, handing the cube definition to
/// `solve`. Returns `None` for a request with nothing in it.
pub fn respond(request: &str, solve: impl FnOnce(&str) -> String) -> Option<Reply> {
    let request = request.to_uppercase();
    if request.trim_start().starts_with('X') {
        return Some(Reply::Close);
    }

    let definition = request
        .chars()
        .filter(|c| REQUEST_CHARS.contains(*c))
        .collect::<String>();
    if definition.is_empty() {
        return None;
    }

    Some(match definition.find("GET") {
        Some(pos) => {
            let cube = definition[pos + 3..].chars().take(54).collect::<String>();
            Reply::Page(format!("{PAGE_HEAD}{}{PAGE_TAIL}", solve(&cube)))
        }
        None => Reply::Line(format!("{}\n", solve(&definition))),
    })
}

fn request_too_long() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("request longer than {MAX_REQUEST_LEN} bytes"),
    )
}

/// Reads up to the next `\n` or `\r`. `None` once the peer hung up.
///
/// # Errors
///
/// Any I/O error, and `InvalidData` for a request longer than
/// [`MAX_REQUEST_LEN`].
fn read_request(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = Vec::new();
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        if let Some(end) = buf.iter().position(|&b| b == b'\n' || b == b'\r') {
            if line.len() + end > MAX_REQUEST_LEN {
                return Err(request_too_long());
            }
            line.extend_from_slice(&buf[..end]);
            reader.consume(end + 1);
            return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
        }
        line.extend_from_slice(buf);
        let len = buf.len();
        reader.consume(len);
        if line.len() > MAX_REQUEST_LEN {
            return Err(request_too_long());
        }
    }
}

fn answer(solver: &TwoPhaseSolver<'_>, definition: &str) -> String {
    match solver.solve(definition) {
        Ok(solution) => solution.to_string(),
        Err(e) => format!("Error: {e}"),
    }
}

fn handle_client(stream: TcpStream, solver: &TwoPhaseSolver<'_>) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;

    while let Some(request) = read_request(&mut reader)? {
        match respond(&request, |definition| answer(solver, definition)) {
            None => {}
            Some(Reply::Line(text)) => writer.write_all(text.as_bytes())?,
            Some(Reply::Page(page)) => {
                writer.write_all(page.as_bytes())?;
                break;
            }
            Some(Reply::Close) => break,
        }
    }
    Ok(())
}

/// Accepts connections forever, serving each one on its own thread.
///
/// # Errors
///
/// Failing to bind the port. Errors on single connections are only logged.
pub fn serve(port: u16, solver: &TwoPhaseSolver<'_>) -> io::Result<()> {
    info!(start!("Binding port {}"), port);
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    info!(success!("Listening on port {}"), port);

    thread::scope(|scope| {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Failed to accept a connection: {e}");
                    continue;
                }
            };
            let peer = stream
                .peer_addr()
                .map_or_else(|_| "unknown peer".to_owned(), |addr| addr.to_string());
            info!("Client {peer} connected");

            scope.spawn(move || {
                match handle_client(stream, solver) {
                    Ok(()) => debug!("Client {peer} done"),
                    Err(e) => warn!("Connection to {peer} failed: {e}"),
                }
                info!("Client {peer} disconnected");
            });
        }
    });
    Ok(())
}
