mod http_api;
mod storage;

// Integration tests, built as one test crate so the mocks can be shared.
// - calendar_api: the calendar actor and mirror against a local fake of the REST API
// - http_api: the axum router end to end
// - resolver_flow: free text to dispatch with a scripted language model
// - smoke_tests: config and component wiring
// - storage: in-memory conversation log and event mirror
