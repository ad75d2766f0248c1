use std::env;
use std::io::{Read, Write};
use std::net::TcpListener;

fn usage(binname: &String) {
    eprintln!(
        "Usage: {} <option>
Options:
\tpidfile <path> <api_key> <pid> <uri>
\tserve <port> <miss_count> <address> <subject>",
        binname
    );
}

/// Write an enclave descriptor file the way a freshly enrolled enclave would.
fn write_pidfile(path: String, api_key: String, pid: i32, uri: String) -> Result<(), String> {
    let descriptor = serde_json::json!({
        "api_key": api_key,
        "heartbeat": 30,
        "pid": pid,
        "uri": uri,
    });
    std::fs::write(&path, descriptor.to_string())
        .map_err(|e| format!("Error writing pid file: {}", e))
}

/// Serve the fabric status API on the given port. The first `miss_count`
/// requests report an empty virtual address; every request after that reports
/// the provisioned identity.
fn serve(port: u16, miss_count: usize, address: String, subject: String) -> Result<(), String> {
    let listener = TcpListener::bind(("127.0.0.1", port))
        .map_err(|e| format!("Error binding port {}: {}", port, e))?;
    let mut served = 0usize;
    for stream in listener.incoming() {
        let mut stream = stream.map_err(|e| format!("Error accepting connection: {}", e))?;
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf);
        let body = if served < miss_count {
            serde_json::json!({"Profile": {"VirtualAddress": ""}})
        } else {
            serde_json::json!({"Profile": {
                "VirtualAddress": address,
                "Certificate": {"subjectDistinguishedName": subject},
            }})
        }
        .to_string();
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        stream
            .write_all(response.as_bytes())
            .map_err(|e| format!("Error writing response: {}", e))?;
        served += 1;
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        usage(&args[0]);
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "pidfile" if args.len() == 6 => {
            let pid = args[4].parse::<i32>();
            match pid {
                Ok(pid) => write_pidfile(args[2].clone(), args[3].clone(), pid, args[5].clone()),
                Err(_) => Err(format!("Invalid pid: {}", args[4])),
            }
        }
        "serve" if args.len() == 6 => {
            match (args[2].parse::<u16>(), args[3].parse::<usize>()) {
                (Ok(port), Ok(miss_count)) => {
                    serve(port, miss_count, args[4].clone(), args[5].clone())
                }
                _ => Err(format!("Invalid port or miss count")),
            }
        }
        _ => {
            usage(&args[0]);
            std::process::exit(1);
        }
    };

    if let Err(msg) = result {
        eprintln!("{}", msg);
        std::process::exit(1);
    }
}
