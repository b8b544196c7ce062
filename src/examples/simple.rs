//! Simple example of using proxy-busy-pool.

use proxy_busy_pool::{Family, ProxyList, ProxyPoolConfig};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Loading proxy lists...");

    let ip4 = ProxyPoolConfig::builder()
        // free proxy lists, one URL per line
        .sources(vec![
            "https://cdn.jsdelivr.net/gh/proxifly/free-proxy-list@main/proxies/protocols/http/data.txt",
        ])
        .fetch_timeout(Duration::from_secs(5))
        .build();

    let list = ProxyList::with_config(ip4, ProxyPoolConfig::default());
    list.load(b"http://[2001:db8::1]:8080\nhttp://[2001:db8::2]:8080\n", Family::V6)?;

    let (ip4_result, _) = list.refresh().await?;
    match ip4_result {
        Ok(bad) => println!("Skipped {} bad IPv4 lines", bad.len()),
        Err(e) => println!("Could not refresh IPv4 proxies: {}", e),
    }

    // every target site gets its own view of which proxies are busy
    for site in ["example.com", "example.org"] {
        if let Some(lease) = list.lease(site, Family::V6) {
            println!("{} -> {}", site, lease.url());
        }
    }

    let url = list.get_free("example.com", Family::V4);
    println!("IPv4 proxy for example.com: {:?}", url.as_ref().map(|u| u.as_str()));
    println!(
        "IPv4 busy for example.com: {}/{}",
        list.num_busy("example.com", Family::V4),
        list.len(Family::V4)
    );
    if let Some(url) = url {
        list.set_free("example.com", &url, Family::V4);
    }

    println!("{}", list);

    Ok(())
}
