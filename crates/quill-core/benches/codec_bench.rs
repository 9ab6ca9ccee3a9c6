//! Benchmarks for the sync codec and dotted-path document access.
//!
//! Run with `cargo bench --package quill-core`.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use quill_core::domain::change::ChangeRecord;
use quill_core::protocol::messages::ConfigSyncMessage;
use quill_core::{decode_message, encode_message, Document, PeerMessage};

fn representative_document() -> Document {
    Document::from_value(json!({
        "noteDir": "/home/user/notes",
        "debug": false,
        "editor": { "keybinding": "vim" },
        "git": {
            "username": "user",
            "userEmail": "user@example.com",
            "remote": "git@example.com:notes.git",
            "remote-auth": { "type": "ssh", "publicKey": "pub", "privateKey": "priv" },
        },
    }))
    .expect("object")
}

fn bench_encode_decode(c: &mut Criterion) {
    let msg = PeerMessage::ConfigSync(ConfigSyncMessage {
        document: representative_document(),
        change: ChangeRecord::new("editor.keybinding", json!("vim"), Some(json!("default"))),
    });

    c.bench_function("encode_config_sync", |b| {
        b.iter(|| encode_message(black_box(&msg), 0).expect("encode"))
    });

    let encoded = encode_message(&msg, 0).expect("encode");
    c.bench_function("decode_config_sync", |b| {
        b.iter(|| decode_message(black_box(&encoded)).expect("decode"))
    });
}

fn bench_dotted_path(c: &mut Criterion) {
    let doc = representative_document();
    c.bench_function("document_get_nested", |b| {
        b.iter(|| doc.get(black_box("git.remote-auth")))
    });

    c.bench_function("document_set_nested", |b| {
        b.iter_batched(
            representative_document,
            |mut doc| doc.set("git.remote", json!("https://example.com/other.git")),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_encode_decode, bench_dotted_path);
criterion_main!(benches);
