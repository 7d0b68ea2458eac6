use markly_api::{Client, MarklyApiError, Request};
use uuid::Uuid;

#[tokio::main]
pub async fn main() -> Result<(), MarklyApiError> {
    let client = Client::new("https://project.supabase.co", "anon_key").bearer_auth("access_token");
    let user_id = Uuid::nil();

    let req = Request::bookmarks(user_id).list();

    let _res = client.send(req).await?;
    Ok(())
}
