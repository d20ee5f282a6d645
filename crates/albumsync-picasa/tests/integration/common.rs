//! Shared test helpers for album feed integration tests
//!
//! Each helper mounts the necessary mock endpoints on a wiremock server.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use albumsync_core::ports::local_directory::FileContent;
use albumsync_picasa::client::PicasaClient;

pub const USER_ID: &str = "alice";
pub const ALBUM_ID: &str = "5842";
pub const ACCESS_TOKEN: &str = "test-access-token";

/// `/user/alice/albumid/5842`
pub fn album_path() -> String {
    PicasaClient::album_path(USER_ID, ALBUM_ID)
}

/// Starts a mock server and returns a client pointing at it
pub async fn setup_album_mock() -> (MockServer, PicasaClient) {
    let server = MockServer::start().await;
    let client = PicasaClient::with_base_url(ACCESS_TOKEN, server.uri());
    (server, client)
}

/// In-memory file content for upload requests
pub fn file_content(data: &[u8]) -> FileContent {
    FileContent {
        len: data.len() as u64,
        reader: Box::new(std::io::Cursor::new(data.to_vec())),
    }
}

/// Builds an Atom album feed with one entry per title
pub fn album_feed(titles: &[&str]) -> String {
    let mut feed = String::from(
        "<?xml version='1.0' encoding='UTF-8'?>\
         <feed xmlns='http://www.w3.org/2005/Atom' xmlns:media='http://search.yahoo.com/mrss/'>\
         <title type='text'>Holidays</title>",
    );
    for title in titles {
        feed.push_str(&format!(
            "<entry><title type='text'>{title}</title>\
             <media:group><media:title type='plain'>{title}</media:title></media:group></entry>"
        ));
    }
    feed.push_str("</feed>");
    feed
}

/// Mounts `GET` on the album feed answering with `body`
pub async fn mount_listing(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path(album_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .append_header("Content-Type", "application/atom+xml"),
        )
        .mount(server)
        .await;
}

/// Mounts `GET` on the album feed answering with `status` and no feed
pub async fn mount_listing_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path(album_path()))
        .respond_with(ResponseTemplate::new(status).set_body_string("error"))
        .mount(server)
        .await;
}
