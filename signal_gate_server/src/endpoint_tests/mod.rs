mod dispatcher;
mod helpers;
mod mocks;
mod postback;
mod webhook;
mod worker;
