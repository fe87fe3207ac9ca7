mod roundtrip;
mod routes;
mod support;
