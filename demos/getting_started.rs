use spire_io::SpireClientBuilder;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn snafu::Error>> {
    env_logger::init();

    let email = env::var("SPIRE_EMAIL")?;
    let password = env::var("SPIRE_PASSWORD")?;

    let spire = SpireClientBuilder::with_reqwest_transport()
        .with_default_url()
        .build()?;

    let description = spire.discover().await?;
    println!("API resources: {:?}", description.resources.keys());

    let session = spire.login(email, password).await?;
    println!("session: {}", session.url());

    let channel = session.find_or_create_channel("getting-started").await?;
    let subscription = session
        .find_or_create_subscription("getting-started-reader", &["getting-started"])
        .await?;

    channel.publish("Message 1").await?;
    channel.publish("Message 2").await?;

    // Non-blocking poll returns everything published after the cursor.
    let batch = subscription.poll().await?;
    println!("received: {:?}", batch.contents());
    println!("cursor: {}", subscription.cursor());

    // Nothing new yet, the cursor doesn't move.
    let batch = subscription.poll().await?;
    println!("received: {:?}", batch.contents());

    Ok(())
}
