use benchmark_simple::*;
use jose_keygen::prelude::*;

fn main() {
    let bench = Bench::new();

    let options = &Options {
        iterations: 1000,
        warmup_iterations: 100,
        min_samples: 5,
        max_samples: 10,
        max_rsd: 1.0,
        ..Default::default()
    };

    let res = bench.run(options, || produce("HS256", Formats::JWK).unwrap());
    println!("hs256 - jwk: {}", res.throughput(1));

    let res = bench.run(options, || produce("ES256", Formats::ALL).unwrap());
    println!("es256 - jwk+pem: {}", res.throughput(1));

    let res = bench.run(options, || produce("ES512", Formats::ALL).unwrap());
    println!("es512 - jwk+pem: {}", res.throughput(1));

    let res = bench.run(options, || produce("EdDSA", Formats::ALL).unwrap());
    println!("eddsa - jwk+pem: {}", res.throughput(1));

    let res = bench.run(options, || {
        generate(KeySpec::OctetKeyPair {
            curve: OkpCurve::X25519,
        })
        .unwrap()
    });
    println!("x25519 - generate: {}", res.throughput(1));

    let rsa_options = &Options {
        iterations: 5,
        warmup_iterations: 1,
        min_samples: 3,
        max_samples: 5,
        max_rsd: 10.0,
        ..Default::default()
    };
    let res = bench.run(rsa_options, || produce("RS256", Formats::PEM).unwrap());
    println!("rsa-2048 - pem: {}", res.throughput(1));

    let kp = generate(KeySpec::Rsa { modulus_bits: 2048 }).unwrap();
    let algorithm = Algorithm::from_name("RS256").unwrap();
    let res = bench.run(options, || to_jwk(&kp, algorithm, algorithm.key_use()).unwrap());
    println!("rsa-2048 - jwk encoding: {}", res.throughput(1));
}
