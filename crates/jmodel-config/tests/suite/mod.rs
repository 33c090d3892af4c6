mod loading;
mod model;
