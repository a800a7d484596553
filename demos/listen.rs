use spire_io::SpireClientBuilder;
use std::{env, time::Duration};
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), Box<dyn snafu::Error>> {
    env_logger::init();

    let key = env::var("SPIRE_ACCOUNT_KEY")?;

    let spire = SpireClientBuilder::with_reqwest_transport()
        .with_default_url()
        .with_long_poll_timeout(10)
        .build()?;
    let session = spire.create_session(key).await?;

    let channel = session.find_or_create_channel("listen-demo").await?;
    let subscription = session
        .find_or_create_subscription("listen-demo-reader", &["listen-demo"])
        .await?;

    let name = subscription.add_listener("message", None, |event| async move {
        println!("message {}: {:?}", event.timestamp(), event.content());
    })?;
    subscription.add_listener("join", Some("joins"), |event| async move {
        println!("join {}", event.timestamp());
    })?;
    subscription.start_listening()?;

    for index in 0..5 {
        channel.publish(format!("Message {index}")).await?;
        sleep(Duration::from_secs(1)).await;
    }

    subscription.remove_listener("message", name.as_str(), true)?;
    channel.publish("Not delivered to the removed listener").await?;
    sleep(Duration::from_secs(2)).await;

    subscription.stop_listening(true);
    if let Some(error) = subscription.last_listening_error() {
        println!("listening stopped with error: {error}");
    }

    Ok(())
}
