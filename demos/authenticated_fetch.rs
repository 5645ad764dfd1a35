//! Demonstrates wrapping a reqwest transport once and letting every call site inherit the token.
//!
//! 1. Open a [`FileStore`] that plays the role of the browser's persistent storage.
//! 2. Wrap a [`ReqwestFetch`] with [`FetchExt::authenticated`] at startup.
//! 3. Issue requests through code that only knows about [`Fetch`]; the first goes out anonymous,
//!    the second carries the token written by the "login" step in between.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use bearer_fetch::{
	credential::ACCESS_TOKEN_KEY,
	http::{Fetch, FetchExt, ReqwestFetch},
	options::RequestOptions,
	store::{FileStore, KeyValueStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let path = env::temp_dir().join("bearer_fetch_demo").join("storage.json");
	let login = FileStore::open(&path)?;
	let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path)?);
	let client = ReqwestFetch::try_new()?
		.with_base_url(Url::parse("https://httpbin.org/")?)
		.authenticated(store);

	login.remove(ACCESS_TOKEN_KEY)?;

	println!("Before login: HTTP {}.", load_profile(&client).await?);

	login.insert(ACCESS_TOKEN_KEY, "demo-token")?;

	println!("After login: HTTP {}.", load_profile(&client).await?);

	login.remove(ACCESS_TOKEN_KEY)?;

	Ok(())
}

/// A call site that has never heard of bearer tokens.
async fn load_profile<F>(client: &F) -> Result<u16>
where
	F: Fetch<Response = reqwest::Response>,
{
	let options = RequestOptions::default().header("Accept", "application/json");
	let response = client.fetch("/bearer".into(), options).await?;

	Ok(response.status().as_u16())
}
