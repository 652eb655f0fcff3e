use dysig_rs::{douyin, tiktok};

const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

#[tokio::main]
async fn main() {
    env_logger::init();

    // Read query string and optional user agent from args
    let query = std::env::args().nth(1).expect("No query string provided");
    let user_agent = std::env::args().nth(2).unwrap_or(DEFAULT_UA.to_string());

    println!("Signing {}", query);

    let a_bogus =
        douyin::generate_signature(&query, &user_agent).expect("Could not generate a_bogus");
    println!("a_bogus: {}", a_bogus);

    let x_bogus = tiktok::generate_x_bogus(&query, &user_agent, None)
        .await
        .expect("Could not generate X-Bogus");
    println!("X-Bogus: {}", x_bogus);
}
