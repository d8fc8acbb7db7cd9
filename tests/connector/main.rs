mod dispatcher;
mod response_normalizer;
