mod engine;
mod invoker;
