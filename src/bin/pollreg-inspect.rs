// Offline snapshot inspector: prints tallies from a registry snapshot file.

use pollreg_core::snapshot::{PersistedPoll, PersistedRegistry};
use std::env;
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    let mut snapshot_path: Option<String> = None;
    let mut poll_filter: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--snapshot" => snapshot_path = args.next(),
            "--poll" => poll_filter = args.next(),
            _ => {
                eprintln!("unknown arg {}", arg);
                eprintln!("usage: pollreg-inspect --snapshot <path> [--poll <hex id>]");
                return;
            }
        }
    }

    let snapshot_path = snapshot_path.expect("missing --snapshot");
    let data = fs::read_to_string(&snapshot_path).expect("read snapshot");
    let snapshot: PersistedRegistry = serde_json::from_str(&data).expect("parse snapshot json");

    let filter = poll_filter.map(|h| {
        let bytes = hex::decode(h.trim()).expect("bad poll id hex");
        let mut id = [0u8; 32];
        if bytes.len() != 32 {
            panic!("poll id must be 32 bytes hex");
        }
        id.copy_from_slice(&bytes);
        id
    });

    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    println!(
        "snapshot version {} with {} poll(s)",
        snapshot.version,
        snapshot.polls.len()
    );
    for poll in &snapshot.polls {
        if let Some(id) = filter
            && poll.poll_id != id
        {
            continue;
        }
        print_poll(poll, now_ms);
    }
}

fn print_poll(poll: &PersistedPoll, now_ms: u64) {
    let state = if now_ms > poll.deadline_ms {
        "expired"
    } else {
        "open"
    };
    println!("poll {}", hex::encode(poll.poll_id));
    println!("  deadline_ms {} ({})", poll.deadline_ms, state);
    println!("  options     {}", poll.option_count);
    for (i, count) in poll.vote_counts.iter().enumerate() {
        println!("  option {}    {}", i + 1, count);
    }
    println!("  voters      {}", poll.votes.len());
}
