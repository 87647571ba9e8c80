use async_trait::async_trait;
use revsync_bugzilla::{AttachmentCreate, BugCreate, BugUpdate, BugzillaClient, Comment};

use super::traits::TicketTracker;

#[async_trait]
impl TicketTracker for BugzillaClient {
    async fn create_ticket(&self, ticket: &BugCreate) -> anyhow::Result<u64> {
        Ok(self.create_bug(ticket).await?)
    }

    async fn attach_file(&self, attachment: &AttachmentCreate) -> anyhow::Result<()> {
        self.create_attachment(attachment).await?;
        Ok(())
    }

    async fn add_comment(&self, id: u64, body: &str) -> anyhow::Result<()> {
        Ok(BugzillaClient::add_comment(self, id, body).await?)
    }

    async fn set_status(
        &self,
        id: u64,
        status: &str,
        resolution: &str,
        comment: &str,
    ) -> anyhow::Result<()> {
        let update = BugUpdate {
            id,
            ids: vec![id],
            comment: Some(Comment {
                body: comment.to_string(),
            }),
            status: Some(status.to_string()),
            resolution: Some(resolution.to_string()),
            ..BugUpdate::default()
        };
        self.update_bug(&update).await?;
        Ok(())
    }

    fn show_url(&self, id: u64) -> String {
        self.show_bug(id)
    }

    fn id_from_url(&self, url: &str) -> anyhow::Result<u64> {
        Ok(self.id_from_show_bug(url)?)
    }
}
