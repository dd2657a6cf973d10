//! Interactive demo client
//!
//! Run with: cargo run --example clientdemo
//!
//! Connects one producer and one consumer to a broker on localhost and turns
//! stdin lines into broker traffic:
//!
//!   <topic> <message>    publish a message
//!   sub <topic>          subscribe the consumer to a topic
//!   unsub <topic>        unsubscribe the consumer from a topic
//!   exit                 quit
//!
//! Everything the consumer receives is printed as `<[topic] message`.
//! Expects `BROKER_CA` to point at the broker's certificate PEM.

use broker_rs::client::{ClientConfig, Consumer, Producer};
use broker_rs::transport::TlsClientConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Debug)]
enum Command {
    Subscribe(String),
    Unsubscribe(String),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let ca_path = std::env::var("BROKER_CA")?;
    let tls = TlsClientConfig::from_ca_pem_file(&ca_path)?;

    let mut producer = Producer::connect(&ClientConfig::new("localhost:8081"), &tls).await?;
    let consumer = Consumer::connect(&ClientConfig::new("localhost:8082"), &tls).await?;

    let (commands, command_rx) = mpsc::channel(16);
    tokio::spawn(run_consumer(consumer, command_rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "exit" {
            break;
        }

        let Some((first, rest)) = line.split_once(' ') else {
            println!("Invalid syntax, correct one: [topic message] or [sub/unsub topic]");
            continue;
        };

        match first {
            "sub" => commands.send(Command::Subscribe(rest.to_string())).await?,
            "unsub" => commands.send(Command::Unsubscribe(rest.to_string())).await?,
            topic => {
                producer.publish(topic, rest).await?;
                println!(">[{}] {}", topic, rest);
            }
        }
    }

    Ok(())
}

enum Event {
    Command(Option<Command>),
    Delivery(broker_rs::Result<Option<broker_rs::Envelope>>),
}

/// Owns the consumer: applies control commands and prints deliveries
async fn run_consumer(mut consumer: Consumer, mut commands: mpsc::Receiver<Command>) {
    loop {
        let event = tokio::select! {
            command = commands.recv() => Event::Command(command),
            envelope = consumer.recv() => Event::Delivery(envelope),
        };

        match event {
            Event::Command(Some(Command::Subscribe(topic))) => {
                if let Err(e) = consumer.subscribe(&topic).await {
                    eprintln!("subscribe failed: {e}");
                    return;
                }
            }
            Event::Command(Some(Command::Unsubscribe(topic))) => {
                if let Err(e) = consumer.unsubscribe(&topic).await {
                    eprintln!("unsubscribe failed: {e}");
                    return;
                }
            }
            Event::Command(None) => return,
            Event::Delivery(Ok(Some(envelope))) => println!("<{}", envelope),
            Event::Delivery(Ok(None)) => return,
            Event::Delivery(Err(e)) => {
                eprintln!("receive failed: {e}");
                return;
            }
        }
    }
}
