use crate::storage::PersistentCookieJar;

use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use url::Url;

fn api_url() -> Url {
    Url::parse("http://localhost:8000/api/").unwrap()
}

fn receive(jar: &PersistentCookieJar, set_cookie: &'static str) {
    let header = HeaderValue::from_static(set_cookie);
    jar.set_cookies(&mut std::iter::once(&header), &api_url());
}

/// **VALUE**: Verifies that a session cookie saved by one jar is sent by a new
/// jar loaded from the same file.
///
/// **WHY THIS MATTERS**: This is the "survives a restart" contract of the
/// cookie strategy, the counterpart of the bearer token file.
///
/// **BUG THIS CATCHES**: Would catch session cookies (no `Expires`) being
/// dropped on save, or a temp file never renamed into place.
#[test]
fn given_session_cookie_saved_when_reloaded_then_sent_again() {
    // GIVEN: A jar that received a session cookie and was saved
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cookies.json");
    let first = PersistentCookieJar::load(&path);
    receive(&first, "laravel_session=s3cr3t; Path=/; HttpOnly");
    first.save().unwrap();

    // WHEN: Loading the same file again
    let second = PersistentCookieJar::load(&path);

    // THEN: The cookie is sent to the API and no temp file is left behind
    let header = second.cookies(&api_url()).unwrap();
    assert_eq!(header.to_str().unwrap(), "laravel_session=s3cr3t");
    assert!(!path.with_extension("json.tmp").exists());
}

/// **VALUE**: Verifies that clearing and saving leaves nothing for the next run.
///
/// **BUG THIS CATCHES**: Would catch `clear` only affecting memory.
#[test]
fn given_cleared_jar_when_saved_and_reloaded_then_empty() {
    // GIVEN: A saved jar with a cookie
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cookies.json");
    let jar = PersistentCookieJar::load(&path);
    receive(&jar, "laravel_session=s3cr3t; Path=/");
    jar.save().unwrap();

    // WHEN: Clearing and saving
    jar.clear();
    jar.save().unwrap();

    // THEN: A reload is empty
    let reloaded = PersistentCookieJar::load(&path);
    assert!(reloaded.is_empty());
    assert!(reloaded.cookies(&api_url()).is_none());
}

/// **VALUE**: Verifies a corrupt cookie file does not prevent startup.
///
/// **WHY THIS MATTERS**: Cookies are a cache of server state; losing them means
/// signing in again, refusing to start means the user cannot sign in at all.
///
/// **BUG THIS CATCHES**: Would catch a panic or hard failure on bad JSON.
#[test]
fn given_corrupt_cookie_file_when_loaded_then_starts_empty() {
    // GIVEN: A file that is not a cookie jar
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cookies.json");
    std::fs::write(&path, "{ not json").unwrap();

    // WHEN: Loading it
    let jar = PersistentCookieJar::load(&path);

    // THEN: Should start empty and still be able to save over it
    assert!(jar.is_empty());
    receive(&jar, "a=b; Path=/");
    jar.save().unwrap();
    assert!(!PersistentCookieJar::load(&path).is_empty());
}

/// **VALUE**: Verifies cookie values are percent-decoded for the CSRF header.
///
/// **BUG THIS CATCHES**: Would catch the still-encoded value being echoed,
/// which the backend rejects with 419.
#[test]
fn given_encoded_cookie_when_reading_value_then_decoded() {
    // GIVEN: An encoded CSRF cookie
    let jar = PersistentCookieJar::in_memory();
    receive(&jar, "XSRF-TOKEN=tok%3D123; Path=/");

    // WHEN / THEN: Reading it decodes; unknown names are absent
    assert_eq!(jar.value(&api_url(), "XSRF-TOKEN").as_deref(), Some("tok=123"));
    assert_eq!(jar.value(&api_url(), "missing"), None);
}

#[test]
fn given_in_memory_jar_when_saved_then_nothing_written() {
    let jar = PersistentCookieJar::in_memory();
    receive(&jar, "a=b; Path=/");

    assert!(jar.save().is_ok());
    assert!(jar.path().is_none());
}
