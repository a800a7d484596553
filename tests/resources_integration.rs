mod fake_spire;

#[cfg(test)]
mod integration {
    use super::fake_spire::FakeSpire;
    use spire_io::core::SpireError;

    /// Two clients creating the same channel end up with the same resource.
    #[tokio::test]
    async fn should_find_or_create_channel_concurrently() -> Result<(), Box<dyn std::error::Error>>
    {
        let fake = FakeSpire::start().await;
        let first = fake.client()?.create_session("first-key").await?;
        let second = fake.client()?.create_session("second-key").await?;

        let (first_channel, second_channel) = tokio::join!(
            first.find_or_create_channel("foo"),
            second.find_or_create_channel("foo")
        );

        assert_eq!(first_channel?.url(), second_channel?.url());
        assert_eq!(fake.created_channels(), 1);
        assert_eq!(fake.requests_to("POST", "/channels").await, 2);

        Ok(())
    }

    /// Creating an existing channel explicitly reports the conflict.
    #[tokio::test]
    async fn should_report_conflict_on_create() -> Result<(), Box<dyn std::error::Error>> {
        let fake = FakeSpire::start().await;
        let session = fake.client()?.create_session("account-key").await?;
        session.create_channel("foo").await?;

        let result = session.create_channel("foo").await;

        assert!(matches!(result, Err(SpireError::Conflict { status: 409, .. })));

        Ok(())
    }

    /// Subscriptions can't be made on channels which don't exist.
    #[tokio::test]
    async fn should_reject_unknown_channel() -> Result<(), Box<dyn std::error::Error>> {
        let fake = FakeSpire::start().await;
        let session = fake.client()?.create_session("account-key").await?;

        let result = session.create_subscription(Some("reader"), &["missing"]).await;

        assert!(matches!(result, Err(SpireError::InvalidArgument { .. })));
        assert_eq!(fake.requests_to("POST", "/subscriptions").await, 0);

        Ok(())
    }

    /// Channel list is served from cache once fetched.
    #[tokio::test]
    async fn should_cache_channels() -> Result<(), Box<dyn std::error::Error>> {
        let fake = FakeSpire::start().await;
        let session = fake.client()?.create_session("account-key").await?;
        session.find_or_create_channel("news").await?;

        let channels = session.channels().await?;
        session.channel("news").await?;
        session.channels().await?;

        assert!(channels.contains_key("news"));
        assert_eq!(fake.requests_to("GET", "/channels").await, 1);

        Ok(())
    }
}
